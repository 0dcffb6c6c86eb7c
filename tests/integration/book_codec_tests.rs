/*!
 * Integration tests for reading and writing unpacked books
 */

use std::fs;

use anyhow::Result;
use booktrans::book::{BookCodec, BookDocument, Chapter};
use booktrans::errors::DocumentError;

use crate::common::{self, SAMPLE_CHAPTERS};

fn chapter_names(document: &BookDocument) -> Vec<&str> {
    document.chapters().iter().map(Chapter::name).collect()
}

#[test]
fn test_read_withSampleBook_shouldSplitChaptersAndResources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), false)?;

    let document = BookCodec::read(&book)?;

    assert_eq!(chapter_names(&document), SAMPLE_CHAPTERS.to_vec());
    let mut resources: Vec<&str> = document.resources().iter().map(|r| r.name.as_str()).collect();
    resources.sort();
    assert_eq!(
        resources,
        vec!["META-INF/container.xml", "OEBPS/content.opf", "OEBPS/style.css", "mimetype"]
    );
    Ok(())
}

#[test]
fn test_read_withManifest_shouldFollowManifestOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("book");
    common::create_test_file(
        &root,
        "OEBPS/content.opf",
        &common::package_opf(&["text/intro.xhtml", "./text/body.xhtml#start", "../OEBPS/text/appendix.xhtml"]),
    )?;
    for name in ["appendix", "body", "intro", "notes"] {
        common::create_test_file(
            &root,
            &format!("OEBPS/text/{}.xhtml", name),
            &common::chapter_xhtml(name, "<p>x</p>"),
        )?;
    }

    let document = BookCodec::read(&root)?;

    // Unlisted chapters come last, in path order
    assert_eq!(
        chapter_names(&document),
        vec![
            "OEBPS/text/intro.xhtml",
            "OEBPS/text/body.xhtml",
            "OEBPS/text/appendix.xhtml",
            "OEBPS/text/notes.xhtml"
        ]
    );
    Ok(())
}

#[test]
fn test_read_withoutManifest_shouldUsePathOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("site");
    common::create_test_file(&root, "b.html", "<p>b</p>")?;
    common::create_test_file(&root, "a.htm", "<p>a</p>")?;

    let document = BookCodec::read(&root)?;

    assert_eq!(chapter_names(&document), vec!["a.htm", "b.html"]);
    Ok(())
}

#[test]
fn test_write_afterRead_shouldReproduceEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), false)?;
    let out = temp_dir.path().join("copy");

    let document = BookCodec::read(&book)?;
    BookCodec::write(&document, &out)?;

    for chapter in document.chapters() {
        assert_eq!(fs::read(out.join(chapter.name()))?, chapter.get_content());
    }
    for resource in document.resources() {
        assert_eq!(fs::read(out.join(&resource.name))?, fs::read(book.join(&resource.name))?);
    }
    assert_eq!(BookCodec::read(&out)?, document);
    Ok(())
}

#[test]
fn test_read_withMissingDirectory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let result = BookCodec::read(temp_dir.path().join("nope"));

    assert!(matches!(result, Err(DocumentError::NotADirectory(_))));
    Ok(())
}

#[test]
fn test_read_withoutChapters_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "style.css", "p {}")?;

    let result = BookCodec::read(temp_dir.path());

    assert!(matches!(result, Err(DocumentError::NoChapters(_))));
    Ok(())
}

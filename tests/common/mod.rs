/*!
 * Common test utilities for the booktrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use booktrans::app_config::Config;

// Re-export the mock translators module
pub mod mock_translators;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content, creating parent directories
pub fn create_test_file(dir: &Path, relative_path: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative_path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Wraps body markup in a minimal XHTML chapter
pub fn chapter_xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <title>{}</title>
  <link rel="stylesheet" type="text/css" href="../style.css"/>
</head>
<body>
{}
</body>
</html>
"#,
        title, body
    )
}

/// Package document listing chapters in the given order
pub fn package_opf(chapter_hrefs: &[&str]) -> String {
    let items: String = chapter_hrefs
        .iter()
        .enumerate()
        .map(|(idx, href)| {
            format!(
                "    <item id=\"c{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                idx, href
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="css" href="style.css" media-type="text/css"/>
{}  </manifest>
</package>
"#,
        items
    )
}

/// Chapter files of the sample book, in reading order
pub const SAMPLE_CHAPTERS: [&str; 3] = [
    "OEBPS/text/chapter1.xhtml",
    "OEBPS/text/chapter2.xhtml",
    "OEBPS/text/chapter3.xhtml",
];

/// Creates an unpacked three-chapter book; chapter 2 has broken markup
/// when `broken_middle` is set
pub fn create_test_book(dir: &Path, broken_middle: bool) -> Result<PathBuf> {
    let root = dir.join("book");

    create_test_file(&root, "mimetype", "application/epub+zip")?;
    create_test_file(
        &root,
        "META-INF/container.xml",
        r#"<?xml version="1.0"?><container><rootfiles><rootfile full-path="OEBPS/content.opf"/></rootfiles></container>"#,
    )?;
    // Manifest order differs from path order
    create_test_file(
        &root,
        "OEBPS/content.opf",
        &package_opf(&["text/chapter1.xhtml", "text/chapter2.xhtml", "text/chapter3.xhtml"]),
    )?;
    create_test_file(&root, "OEBPS/style.css", "p { margin: 0; }\n")?;

    create_test_file(
        &root,
        SAMPLE_CHAPTERS[0],
        &chapter_xhtml(
            "One",
            "  <h1 class=\"chapter\">The Beginning</h1>\n  <p>It was a dark night.</p>\n  <p>The mage walked in.</p>",
        ),
    )?;

    let middle = if broken_middle {
        chapter_xhtml("Two", "  <p>Unfinished <span class=\"x")
    } else {
        chapter_xhtml("Two", "  <p>Nothing happened.</p>")
    };
    create_test_file(&root, SAMPLE_CHAPTERS[1], &middle)?;

    create_test_file(
        &root,
        SAMPLE_CHAPTERS[2],
        &chapter_xhtml(
            "Three",
            "  <div class=\"scene\"><p>The end.</p></div>\n  <figure><img src=\"map.png\"/><figcaption>A map</figcaption></figure>",
        ),
    )?;

    Ok(root)
}

/// Configuration that keeps every file inside `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.cache.path = Some(dir.join("memory.db"));
    config.glossary.path = dir.join("glossary.json");
    config
}

/// Convenience to build owned strings
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

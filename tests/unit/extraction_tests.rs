/*!
 * Tests for text unit extraction and reassembly
 */

use anyhow::Result;
use booktrans::errors::{ExtractionError, ReassemblyError};
use booktrans::translation::extraction::ChapterExtraction;

use crate::common;

fn translate_all(content: &str, f: impl Fn(&str) -> String) -> Result<String> {
    let extraction = ChapterExtraction::extract(content.as_bytes())?;
    let translations: Vec<String> = extraction.units().iter().map(|u| f(&u.source)).collect();
    let output = extraction.reassemble(&translations)?;
    Ok(String::from_utf8(output)?)
}

#[test]
fn test_reassemble_withMixedContentParagraph_shouldLeaveItUntouched() -> Result<()> {
    let chapter = common::chapter_xhtml("Mixed", "<p>Hello <b>world</b></p>");

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;
    assert!(extraction.is_empty());

    let output = translate_all(&chapter, |s| s.to_uppercase())?;
    assert_eq!(output, chapter);
    Ok(())
}

#[test]
fn test_reassemble_withNestedTextElement_shouldOnlyReplaceInnerText() -> Result<()> {
    let chapter = common::chapter_xhtml("Nested", "<div class=\"x\"><p id=\"a\">Hi</p></div>");

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;
    assert_eq!(extraction.len(), 1);
    assert_eq!(extraction.units()[0].tag, "p");

    let output = translate_all(&chapter, |_| "Hola".to_string())?;
    assert_eq!(
        output,
        common::chapter_xhtml("Nested", "<div class=\"x\"><p id=\"a\">Hola</p></div>")
    );
    Ok(())
}

#[test]
fn test_reassemble_withNonWhitelistedElement_shouldNotTranslateIt() -> Result<()> {
    let chapter = common::chapter_xhtml(
        "Other",
        "<p>Para</p><a href=\"#x\">Link</a><td>Cell</td><blockquote>Quote</blockquote>",
    );

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;
    let sources = extraction.sources();
    assert_eq!(sources, common::strings(&["Para"]));

    let output = translate_all(&chapter, |s| s.to_uppercase())?;
    assert_eq!(
        output,
        common::chapter_xhtml(
            "Other",
            "<p>PARA</p><a href=\"#x\">Link</a><td>Cell</td><blockquote>Quote</blockquote>"
        )
    );
    Ok(())
}

#[test]
fn test_extract_withAllWhitelistedTags_shouldFindEachInDocumentOrder() -> Result<()> {
    let body = "<h1>a</h1><h2>b</h2><h3>c</h3><h4>d</h4><h5>e</h5><h6>f</h6>\
                <ul><li>g</li></ul><div>h</div><span>i</span>\
                <table><caption>j</caption></table><figure><figcaption>k</figcaption></figure><p>l</p>";
    let chapter = common::chapter_xhtml("Tags", body);

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;

    assert_eq!(
        extraction.sources(),
        common::strings(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"])
    );
    let indices: Vec<usize> = extraction.units().iter().map(|u| u.index).collect();
    assert_eq!(indices, (0..12).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_extract_shouldIgnoreHeadTitle() -> Result<()> {
    let chapter = common::chapter_xhtml("Title text", "<p>Body text</p>");

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;

    assert_eq!(extraction.sources(), common::strings(&["Body text"]));
    Ok(())
}

#[test]
fn test_reassemble_withTranslationNeedingEscapes_shouldEscapeMarkupCharacters() -> Result<()> {
    let chapter = common::chapter_xhtml("Esc", "<p>Tom &amp; Jerry</p>");

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;
    assert_eq!(extraction.sources(), common::strings(&["Tom & Jerry"]));

    let output = translate_all(&chapter, |_| "Tom & Jerry <3".to_string())?;
    assert!(output.contains("<p>Tom &amp; Jerry &lt;3</p>"));
    Ok(())
}

#[test]
fn test_reassemble_withPaddedText_shouldKeepOriginalWhitespace() -> Result<()> {
    let chapter = common::chapter_xhtml("Pad", "<p>\n    Indented text\n  </p>");

    let output = translate_all(&chapter, |_| "  Texto sangrado ".to_string())?;

    assert!(output.contains("<p>\n    Texto sangrado\n  </p>"));
    Ok(())
}

#[test]
fn test_extract_withScriptAndComments_shouldSkipThem() -> Result<()> {
    let chapter = common::chapter_xhtml(
        "Skip",
        "<script>var p = \"<p>no</p>\";</script><!-- <p>hidden</p> --><p>yes</p><p><!-- c -->mixed</p>",
    );

    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;

    assert_eq!(extraction.sources(), common::strings(&["yes"]));
    Ok(())
}

#[test]
fn test_extract_withTruncatedTag_shouldFailWithMalformed() {
    let chapter = common::chapter_xhtml("Broken", "<p>Unfinished <span class=\"x");

    let result = ChapterExtraction::extract(chapter.as_bytes());

    assert!(matches!(result, Err(ExtractionError::Malformed { .. })));
}

#[test]
fn test_extract_withInvalidUtf8_shouldFailWithEncoding() {
    let mut content = b"<p>ok</p>".to_vec();
    content.push(0xFF);

    let result = ChapterExtraction::extract(&content);

    assert_eq!(result.unwrap_err(), ExtractionError::Encoding(9));
}

#[test]
fn test_reassemble_withWrongTranslationCount_shouldFail() -> Result<()> {
    let chapter = common::chapter_xhtml("Count", "<p>one</p><p>two</p>");
    let extraction = ChapterExtraction::extract(chapter.as_bytes())?;

    let result = extraction.reassemble(&common::strings(&["uno"]));

    assert_eq!(
        result.unwrap_err(),
        ReassemblyError::LengthMismatch {
            expected: 2,
            actual: 1
        }
    );
    Ok(())
}

#[test]
fn test_reassemble_withUnicodeTranslations_shouldProduceValidUtf8() -> Result<()> {
    let chapter = common::chapter_xhtml("Uni", "<h1>Chapter</h1><p>Dragon</p>");

    let output = translate_all(&chapter, |s| match s {
        "Chapter" => "第一章".to_string(),
        _ => "ドラゴン 🐉".to_string(),
    })?;

    assert!(output.contains("<h1>第一章</h1><p>ドラゴン 🐉</p>"));
    Ok(())
}

#[test]
fn test_extract_withAttributesWithoutSeparator_shouldStillTranslate() -> Result<()> {
    let chapter = common::chapter_xhtml("Attrs", r#"<p>One</p><p class="a"id="b">Two</p>"#);

    let output = translate_all(&chapter, |s| s.to_uppercase())?;

    assert!(output.contains(r#"<p>ONE</p><p class="a"id="b">TWO</p>"#));
    Ok(())
}

#[test]
fn test_reassemble_withNbspPadding_shouldKeepIt() -> Result<()> {
    let chapter = common::chapter_xhtml("Nbsp", "<p>&nbsp;Hello&#160;</p><p> &#x20;Bye</p>");

    let output = translate_all(&chapter, |s| match s.trim() {
        "Hello" => "Hola".to_string(),
        _ => "Adios".to_string(),
    })?;

    assert!(output.contains("<p>&nbsp;Hola&#160;</p><p> &#x20;Adios</p>"));
    Ok(())
}

#[test]
fn test_reassemble_withControlCharacterReference_shouldNotEmitRawControlCharacter() -> Result<()> {
    let chapter = common::chapter_xhtml("Ctl", "<p>a&#0;b</p>");

    let output = translate_all(&chapter, |s| format!("X{}", s))?;

    assert!(!output.contains('\0'));
    assert!(output.contains("<p>Xa&amp;#0;b</p>"));
    Ok(())
}

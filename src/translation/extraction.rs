/*!
 * Text unit extraction and reassembly for one chapter.
 *
 * `ChapterExtraction` owns the parse state of a single chapter. It is built
 * by `extract`, hands out the ordered text units, and is consumed by
 * `reassemble`, which splices the translations back into the original bytes.
 * Dropping it (or reassembling) releases everything the chapter needed.
 */

use std::ops::Range;

use crate::errors::{ExtractionError, ReassemblyError};
use crate::markup;

/// Elements whose text is translated
pub const TRANSLATABLE_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "div", "span", "caption", "figcaption",
];

/// One piece of translatable text in a chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Position of the unit in extraction order
    pub index: usize,
    /// Local name of the enclosing element
    pub tag: String,
    /// Byte range of the raw text in the chapter
    pub span: Range<usize>,
    /// Text with character references decoded
    pub source: String,
}

/// Parse state of one chapter between extraction and reassembly
#[derive(Debug)]
pub struct ChapterExtraction {
    content: String,
    units: Vec<TextUnit>,
}

impl ChapterExtraction {
    /// Parse chapter markup and collect its text units in document order
    pub fn extract(content: &[u8]) -> Result<Self, ExtractionError> {
        let content = String::from_utf8(content.to_vec())
            .map_err(|e| ExtractionError::Encoding(e.utf8_error().valid_up_to()))?;

        let units = markup::text_elements(&content)?
            .into_iter()
            .filter(|element| TRANSLATABLE_TAGS.contains(&element.name.as_str()))
            .filter_map(|element| {
                let source = markup::decode_entities(&content[element.text.clone()]).into_owned();
                if source.trim().is_empty() {
                    None
                } else {
                    Some((element, source))
                }
            })
            .enumerate()
            .map(|(index, (element, source))| TextUnit {
                index,
                tag: element.name,
                span: element.text,
                source,
            })
            .collect();

        Ok(Self { content, units })
    }

    /// Extracted units in document order
    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    /// Source texts in document order, ready for batch translation
    pub fn sources(&self) -> Vec<String> {
        self.units.iter().map(|u| u.source.clone()).collect()
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the chapter has nothing to translate
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Write `translations` back over the units and return the new content
    ///
    /// `translations` must line up one-to-one with `units()`. A translation
    /// equal to its source leaves the original bytes untouched; otherwise the
    /// text is escaped and keeps the whitespace that surrounded the original.
    pub fn reassemble(self, translations: &[String]) -> Result<Vec<u8>, ReassemblyError> {
        if translations.len() != self.units.len() {
            return Err(ReassemblyError::LengthMismatch {
                expected: self.units.len(),
                actual: translations.len(),
            });
        }

        let content = &self.content;
        let mut output = String::with_capacity(content.len() + content.len() / 4);
        let mut last = 0;

        for (unit, translation) in self.units.iter().zip(translations) {
            let span = &unit.span;
            if span.start < last
                || span.end > content.len()
                || !content.is_char_boundary(span.start)
                || !content.is_char_boundary(span.end)
            {
                return Err(ReassemblyError::InvalidSpan { index: unit.index });
            }

            output.push_str(&content[last..span.start]);
            output.push_str(&replacement(&content[span.clone()], &unit.source, translation));
            last = span.end;
        }
        output.push_str(&content[last..]);

        Ok(output.into_bytes())
    }
}

fn replacement(raw: &str, source: &str, translation: &str) -> String {
    if translation == source || translation.trim() == source.trim() {
        return raw.to_string();
    }

    let (leading, trailing) = markup::whitespace_padding(raw);
    format!(
        "{}{}{}",
        &raw[..leading],
        markup::escape_text(translation.trim()),
        &raw[raw.len() - trailing..]
    )
}

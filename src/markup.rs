/*!
 * Span-preserving markup scanner for (X)HTML chapters.
 *
 * The scanner walks the tag structure of a chapter with an element stack and
 * reports every element whose only child is a single text node, together
 * with the byte range of that text in the source. Nothing is re-serialized:
 * callers splice replacement text into those ranges, so every byte outside a
 * replaced range stays exactly as it was.
 *
 * Parsing is lenient in the ways real e-book markup needs (stray end tags are
 * ignored, unclosed elements are closed at end of input, HTML void elements
 * need no end tag) but a tag cut off mid-way is reported as malformed.
 */

use std::borrow::Cow;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::ExtractionError;

/// Start tag with optional attributes, anchored at `<`
///
/// Attributes after the first need no separating whitespace (`class="a"id="b"`).
static START_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<([A-Za-z_][\w:.\-]*)(?:\s+[^\s=/>"']+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?(?:\s*[^\s=/>"']+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)?\s*(/?)>"#,
    )
    .expect("Invalid start tag regex")
});

/// End tag, anchored at `<`
static END_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</([A-Za-z_][\w:.\-]*)\s*>").expect("Invalid end tag regex"));

/// Named or numeric character reference
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("Invalid entity regex")
});

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text, not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An element whose only child is one text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextElement {
    /// Local tag name (namespace prefix removed), lowercased
    pub name: String,
    /// Byte offset of the element's start tag
    pub tag_start: usize,
    /// Byte range of the raw (still escaped) text
    pub text: Range<usize>,
}

/// Find every element with a single text child, in document order
pub fn text_elements(source: &str) -> Result<Vec<TextElement>, ExtractionError> {
    let mut scanner = Scanner::new(source);
    scanner.run()?;

    let mut found = scanner.found;
    found.sort_by_key(|element| element.tag_start);
    Ok(found)
}

/// Decode character references in raw text
///
/// Unknown named references are left as they are.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    ENTITY_REGEX.replace_all(raw, |caps: &Captures| match decode_entity(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    })
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).filter(|&c| is_xml_char(c));
    }

    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Characters allowed in an XML document
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Byte lengths of the leading and trailing whitespace of raw text
///
/// Character references that decode to whitespace (`&nbsp;`, `&#32;`) count
/// as whitespace. Text made only of whitespace is all leading.
pub fn whitespace_padding(raw: &str) -> (usize, usize) {
    fn push_chars(segments: &mut Vec<(Range<usize>, bool)>, raw: &str, range: Range<usize>) {
        for (idx, c) in raw[range.clone()].char_indices() {
            let start = range.start + idx;
            segments.push((start..start + c.len_utf8(), c.is_whitespace()));
        }
    }

    let mut segments = Vec::new();

    let mut pos = 0;
    for caps in ENTITY_REGEX.captures_iter(raw) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_chars(&mut segments, raw, pos..whole.start());
        let blank = decode_entity(body.as_str()).is_some_and(char::is_whitespace);
        segments.push((whole.range(), blank));
        pos = whole.end();
    }
    push_chars(&mut segments, raw, pos..raw.len());

    let leading = segments
        .iter()
        .take_while(|(_, blank)| *blank)
        .last()
        .map_or(0, |(range, _)| range.end);
    if leading == raw.len() {
        return (leading, 0);
    }
    let trailing = segments
        .iter()
        .rev()
        .take_while(|(_, blank)| *blank)
        .last()
        .map_or(0, |(range, _)| raw.len() - range.start);

    (leading, trailing)
}

/// Escape text for use as element content
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

enum Token<'s> {
    Start {
        name: &'s str,
        end: usize,
        self_closing: bool,
    },
    End {
        name: &'s str,
        end: usize,
    },
    /// Comment, CDATA section, processing instruction or declaration
    Other {
        end: usize,
    },
}

struct Frame {
    qualified: String,
    local: String,
    tag_start: usize,
    children: usize,
    text: Option<Range<usize>>,
}

struct Scanner<'s> {
    source: &'s str,
    stack: Vec<Frame>,
    found: Vec<TextElement>,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            stack: Vec::new(),
            found: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<(), ExtractionError> {
        let len = self.source.len();
        let mut text_start = 0;
        let mut cursor = 0;

        while cursor < len {
            let Some(relative) = self.source[cursor..].find('<') else {
                break;
            };
            let lt = cursor + relative;

            match self.token_at(lt)? {
                Some(token) => {
                    self.text(text_start..lt);
                    let next = self.apply(token, lt)?;
                    text_start = next;
                    cursor = next;
                }
                // A bare '<' is part of the text
                None => cursor = lt + 1,
            }
        }

        self.text(text_start..len);
        while let Some(frame) = self.stack.pop() {
            self.close(frame);
        }
        Ok(())
    }

    fn token_at(&self, lt: usize) -> Result<Option<Token<'s>>, ExtractionError> {
        let rest = &self.source[lt..];

        let delimited = [
            ("<!--", "-->", "unterminated comment"),
            ("<![CDATA[", "]]>", "unterminated CDATA section"),
            ("<?", "?>", "unterminated processing instruction"),
            ("<!", ">", "unterminated declaration"),
        ];
        for (open, close, reason) in delimited {
            if let Some(body) = rest.strip_prefix(open) {
                let end = body
                    .find(close)
                    .ok_or_else(|| malformed(lt, reason))?;
                return Ok(Some(Token::Other {
                    end: lt + open.len() + end + close.len(),
                }));
            }
        }

        if let Some(after) = rest.strip_prefix("</") {
            if let Some(caps) = END_TAG_REGEX.captures(rest) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    return Err(malformed(lt, "unreadable end tag"));
                };
                return Ok(Some(Token::End {
                    name: name.as_str(),
                    end: lt + whole.end(),
                }));
            }
            if starts_name(after) {
                return Err(malformed(lt, "unterminated end tag"));
            }
            return Ok(None);
        }

        if starts_name(&rest[1..]) {
            let caps = START_TAG_REGEX
                .captures(rest)
                .ok_or_else(|| malformed(lt, "unterminated start tag"))?;
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                return Err(malformed(lt, "unreadable start tag"));
            };
            let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
            return Ok(Some(Token::Start {
                name: name.as_str(),
                end: lt + whole.end(),
                self_closing,
            }));
        }

        Ok(None)
    }

    fn apply(&mut self, token: Token<'s>, lt: usize) -> Result<usize, ExtractionError> {
        match token {
            Token::Start {
                name,
                end,
                self_closing,
            } => {
                self.child();
                let qualified = name.to_ascii_lowercase();
                let local = local_name(&qualified).to_string();

                if self_closing || VOID_ELEMENTS.contains(&local.as_str()) {
                    return Ok(end);
                }
                if RAW_TEXT_ELEMENTS.contains(&local.as_str()) {
                    // Skip straight to the closing tag; it is then handled as a stray end tag
                    let needle = format!("</{}", qualified);
                    let offset = self.source[end..]
                        .to_ascii_lowercase()
                        .find(&needle)
                        .ok_or_else(|| malformed(lt, "unclosed raw text element"))?;
                    return Ok(end + offset);
                }

                self.stack.push(Frame {
                    qualified,
                    local,
                    tag_start: lt,
                    children: 0,
                    text: None,
                });
                Ok(end)
            }
            Token::End { name, end } => {
                let qualified = name.to_ascii_lowercase();
                if let Some(depth) = self.stack.iter().rposition(|f| f.qualified == qualified) {
                    while self.stack.len() > depth {
                        if let Some(frame) = self.stack.pop() {
                            self.close(frame);
                        }
                    }
                }
                Ok(end)
            }
            Token::Other { end } => {
                self.child();
                Ok(end)
            }
        }
    }

    /// Record a non-text child of the current element
    fn child(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.children += 1;
        }
    }

    fn text(&mut self, span: Range<usize>) {
        if span.is_empty() {
            return;
        }
        if let Some(top) = self.stack.last_mut() {
            top.children += 1;
            if top.children == 1 {
                top.text = Some(span);
            }
        }
    }

    fn close(&mut self, frame: Frame) {
        if frame.children != 1 {
            return;
        }
        if let Some(text) = frame.text {
            self.found.push(TextElement {
                name: frame.local,
                tag_start: frame.tag_start,
                text,
            });
        }
    }
}

fn starts_name(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

fn malformed(offset: usize, reason: &str) -> ExtractionError {
    ExtractionError::Malformed {
        offset,
        reason: reason.to_string(),
    }
}

/*!
 * Unpacked e-book container.
 *
 * A book is read from a directory holding the extracted contents of an EPUB
 * (or any tree of XHTML/HTML documents). Content documents become chapters;
 * every other file is carried through unchanged as a resource. Chapter order
 * follows the OPF manifest when a package document is present, otherwise the
 * path order of the files.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::DocumentError;
use crate::file_utils::{FileManager, FileType};

/// Manifest `<item>` element of an OPF package
static MANIFEST_ITEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:[a-z]+:)?item\b([^>]*)>").expect("Invalid manifest item regex"));

/// Single attribute inside a manifest item
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|media-type)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Invalid attribute regex")
});

/// One content document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    name: String,
    content: Vec<u8>,
}

impl Chapter {
    /// Create a chapter; `name` is its path inside the book, `/`-separated
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Path inside the book
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw markup bytes
    pub fn get_content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the markup
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }
}

/// Any non-chapter file, copied through untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub content: Vec<u8>,
}

/// Book contents in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDocument {
    chapters: Vec<Chapter>,
    resources: Vec<Resource>,
}

impl BookDocument {
    /// Create a document from its parts
    pub fn new(chapters: Vec<Chapter>, resources: Vec<Resource>) -> Self {
        Self {
            chapters,
            resources,
        }
    }

    /// Chapters in reading order
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Chapters in reading order, for in-place updates
    pub fn chapters_mut(&mut self) -> &mut [Chapter] {
        &mut self.chapters
    }

    /// Look up a chapter by name
    pub fn chapter(&self, name: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.name == name)
    }

    /// Non-chapter files
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

/// Reads and writes books stored as directories
pub struct BookCodec;

impl BookCodec {
    /// Read every file under `dir`
    pub fn read<P: AsRef<Path>>(dir: P) -> Result<BookDocument, DocumentError> {
        let dir = dir.as_ref();
        if !FileManager::dir_exists(dir) {
            return Err(DocumentError::NotADirectory(dir.to_path_buf()));
        }

        let files = FileManager::list_files(dir).map_err(|e| io_error(dir, e))?;

        let mut chapters = Vec::new();
        let mut resources = Vec::new();
        let mut package = None;

        for path in files {
            let name = relative_name(dir, &path);
            let content = std::fs::read(&path).map_err(|e| io_error(&path, e))?;

            match FileManager::detect_file_type(&path) {
                FileType::Chapter => chapters.push(Chapter::new(name, content)),
                file_type => {
                    if file_type == FileType::Package && package.is_none() {
                        package = Some((name.clone(), String::from_utf8_lossy(&content).into_owned()));
                    }
                    resources.push(Resource { name, content });
                }
            }
        }

        if chapters.is_empty() {
            return Err(DocumentError::NoChapters(dir.to_path_buf()));
        }

        if let Some((opf_name, opf)) = package {
            let order = manifest_order(&opf_name, &opf);
            debug!("Package {} lists {} content documents", opf_name, order.len());
            order_chapters(&mut chapters, &order);
        }

        info!(
            "Read book from {:?}: {} chapters, {} other files",
            dir,
            chapters.len(),
            resources.len()
        );

        Ok(BookDocument::new(chapters, resources))
    }

    /// Write the book under `out_dir`, one file per chapter and resource
    pub fn write<P: AsRef<Path>>(document: &BookDocument, out_dir: P) -> Result<(), DocumentError> {
        let out_dir = out_dir.as_ref();
        FileManager::ensure_dir(out_dir).map_err(|e| io_error(out_dir, e))?;

        let files = document
            .chapters
            .iter()
            .map(|c| (c.name.as_str(), c.content.as_slice()))
            .chain(document.resources.iter().map(|r| (r.name.as_str(), r.content.as_slice())));

        for (name, content) in files {
            let path = out_dir.join(name);
            FileManager::write_atomic(&path, content).map_err(|e| io_error(&path, e))?;
        }

        info!("Wrote book to {:?}", out_dir);
        Ok(())
    }
}

/// Book-relative names of XHTML documents in manifest order
fn manifest_order(opf_name: &str, opf: &str) -> Vec<String> {
    let base = match opf_name.rfind('/') {
        Some(idx) => &opf_name[..=idx],
        None => "",
    };

    MANIFEST_ITEM_REGEX
        .captures_iter(opf)
        .filter_map(|item| {
            let mut href = None;
            let mut media_type = None;
            for attr in ATTRIBUTE_REGEX.captures_iter(item.get(1)?.as_str()) {
                let value = attr.get(2).or_else(|| attr.get(3))?.as_str();
                if attr[1].eq_ignore_ascii_case("href") {
                    href = Some(value);
                } else {
                    media_type = Some(value);
                }
            }
            match (href, media_type) {
                (Some(href), Some("application/xhtml+xml")) => {
                    Some(normalize_path(&format!("{}{}", base, href)))
                }
                _ => None,
            }
        })
        .collect()
}

/// Put manifest chapters first, in manifest order; others keep path order after them
fn order_chapters(chapters: &mut [Chapter], order: &[String]) {
    let rank: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    chapters.sort_by_key(|c| rank.get(c.name.as_str()).copied().unwrap_or(usize::MAX));
}

/// Resolve `.` and `..` segments and drop any fragment
fn normalize_path(path: &str) -> String {
    let path = path.split('#').next().unwrap_or(path);
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn io_error(path: &Path, error: impl std::fmt::Display) -> DocumentError {
    DocumentError::Io {
        path: PathBuf::from(path),
        message: error.to_string(),
    }
}

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions of chapter documents
const CHAPTER_EXTENSIONS: &[&str] = &["xhtml", "html", "htm"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated book
    // @params: input_path, target_language
    pub fn generate_output_path<P: AsRef<Path>>(input_path: P, target_language: &str) -> PathBuf {
        let input_path = input_path.as_ref();

        // Trailing separators would otherwise leave an empty file name
        let name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string());

        let output_name = format!("{}_{}", name, target_language.to_uppercase());
        input_path.with_file_name(output_name)
    }

    /// List files under a directory, sorted by path
    pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref())
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.context("Failed to read directory entry")?;
            if entry.file_type().is_file() {
                result.push(entry.path().to_path_buf());
            }
        }

        Ok(result)
    }

    /// Write bytes through a temporary file in the target directory, then rename
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::ensure_dir(parent)?;

        let mut temp_file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        temp_file
            .write_all(content)
            .with_context(|| format!("Failed to write file: {:?}", path))?;
        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist file: {:?}", path))?;

        Ok(())
    }

    /// Classify a book file by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if CHAPTER_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Chapter
        } else if ext == "opf" {
            FileType::Package
        } else {
            FileType::Resource
        }
    }
}

/// Kinds of file found in an unpacked book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// XHTML/HTML content document
    Chapter,
    /// OPF package document
    Package,
    /// Anything else (styles, images, fonts, metadata)
    Resource,
}

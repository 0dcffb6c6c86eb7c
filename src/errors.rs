/*!
 * Error types for the booktrans application.
 *
 * This module contains custom error types for the different stages of a
 * document job, using the thiserror crate for ergonomic error definitions.
 * Chapter- and batch-scoped errors are recovered by the pipeline; cache-open
 * and codec errors are fatal to the job.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Failure of the translation capability for one batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The capability returned a different number of translations
    #[error("Expected {expected} translations, got {actual}")]
    CountMismatch {
        /// Number of source texts sent
        expected: usize,
        /// Number of translations received
        actual: usize,
    },

    /// The capability did not answer within the configured bound
    #[error("Translation request timed out after {0}s")]
    Timeout(u64),

    /// The response could not be split back into units
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),

    /// Any other failure reported by a translator implementation
    #[error("Translation failed: {0}")]
    Failed(String),
}

/// Errors raised by the translation memory
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store could not be opened or initialised
    #[error("Failed to open translation memory at {path:?}: {message}")]
    Open {
        /// Location of the store
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// A write was rejected by the store
    #[error("Failed to write translation memory entry: {0}")]
    Write(String),

    /// A lookup failed at the storage layer
    #[error("Failed to read translation memory: {0}")]
    Read(String),

    /// The store could not be closed cleanly
    #[error("Failed to close translation memory: {0}")]
    Close(String),
}

/// Errors raised while loading glossary rules
#[derive(Error, Debug)]
pub enum GlossaryError {
    /// The glossary file could not be read
    #[error("Failed to read glossary {path:?}: {source}")]
    Io {
        /// Glossary location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The glossary file is not a JSON object of strings
    #[error("Failed to parse glossary: {0}")]
    Parse(String),

    /// A single rule is unusable
    #[error("Invalid glossary rule '{term}': {reason}")]
    InvalidRule {
        /// Source term of the rule
        term: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Chapter markup could not be parsed or walked
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Content is not valid UTF-8
    #[error("Chapter content is not valid UTF-8 (at byte {0})")]
    Encoding(usize),

    /// Markup is broken beyond lenient recovery
    #[error("Malformed markup at byte {offset}: {reason}")]
    Malformed {
        /// Byte offset of the offending construct
        offset: usize,
        /// Short description
        reason: String,
    },
}

/// Translated text could not be written back
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReassemblyError {
    /// The translated sequence does not line up with the extracted units
    #[error("Expected {expected} translated units, got {actual}")]
    LengthMismatch {
        /// Number of extracted units
        expected: usize,
        /// Number of translations supplied
        actual: usize,
    },

    /// A text span no longer fits the source it was extracted from
    #[error("Text unit {index} refers to an invalid span")]
    InvalidSpan {
        /// Index of the unit
        index: usize,
    },
}

/// Failure scoped to one chapter; the pipeline skips the chapter on any of these
#[derive(Error, Debug)]
pub enum ChapterError {
    /// Extraction failed
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The batch translator broke its contract
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Reassembly failed
    #[error("Reassembly error: {0}")]
    Reassembly(#[from] ReassemblyError),
}

/// Errors from reading or writing the document container
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input does not exist or is not a directory
    #[error("Not an unpacked book directory: {0:?}")]
    NotADirectory(PathBuf),

    /// I/O failure on a specific path
    #[error("I/O error on {path:?}: {message}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// The book has no chapters
    #[error("No chapters found in {0:?}")]
    NoChapters(PathBuf),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the translation memory
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the document codec
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

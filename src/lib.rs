/*!
 * # booktrans
 *
 * A Rust library for translating e-books chapter by chapter with an LLM.
 *
 * ## Features
 *
 * - Read and write unpacked e-book directories (XHTML chapters in reading order)
 * - Extract translatable text units and splice translations back without
 *   touching the surrounding markup
 * - Cache-first batch translation backed by a SQLite translation memory
 * - Glossary post-correction of every translation
 * - Per-chapter failure isolation with progress reporting
 * - Translation through a local Ollama model
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Job driver (cache, glossary, pipeline, output)
 * - `book`: Unpacked e-book container
 * - `markup`: Span-preserving (X)HTML scanner
 * - `translation`: Translation of chapter text:
 *   - `translation::core`: Translator capability and session
 *   - `translation::batch`: Cache-first batch translation
 *   - `translation::cache`: Translation memory
 *   - `translation::glossary`: Glossary post-correction
 *   - `translation::extraction`: Text unit extraction and reassembly
 *   - `translation::pipeline`: Chapter loop and progress events
 * - `database`: SQLite storage for the translation memory
 * - `providers`: Ollama API client
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod book;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use book::{BookCodec, BookDocument, Chapter};
pub use errors::{AppError, ChapterError, ExtractionError, ReassemblyError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{
    BatchOrchestrator, BatchTranslate, GlossaryCorrector, TranslationMemory, TranslationSession,
    Translator,
};

/*!
 * Translation of e-book text.
 *
 * This module contains everything between raw chapter markup and translated
 * chapter markup. It is split into several submodules:
 *
 * - `core`: the `Translator` capability, the job session and the Ollama-backed service
 * - `batch`: cache-first batch translation with glossary correction
 * - `cache`: persistent translation memory
 * - `glossary`: terminology post-correction
 * - `extraction`: text unit extraction and reassembly for one chapter
 * - `pipeline`: chapter loop and progress reporting
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOrchestrator, BatchOutcome, BatchStats, BatchTranslate};
pub use self::cache::{MemoryStats, TranslationMemory};
pub use self::core::{TranslationService, TranslationSession, Translator};
pub use self::extraction::{ChapterExtraction, TextUnit};
pub use self::glossary::{GlossaryCorrector, GlossaryRule};
pub use self::pipeline::{DocumentPipeline, PipelineReport, ProgressSink, Severity};

// Submodules
pub mod batch;
pub mod cache;
pub mod core;
pub mod extraction;
pub mod glossary;
pub mod pipeline;

/*!
 * Document translation pipeline.
 *
 * - `orchestrator`: per-chapter extract / translate / reassemble loop
 * - `progress`: progress events and their receivers
 */

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{
    ChapterOutcome, DocumentPipeline, PipelineReport, SkippedChapter, process,
};
pub use progress::{NoopSink, ProgressSink, Severity};

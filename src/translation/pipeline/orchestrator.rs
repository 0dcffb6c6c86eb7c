/*!
 * Chapter-by-chapter document processing.
 *
 * For every chapter, in reading order: extract text units, translate them as
 * one batch, splice the translations back. A chapter that fails at any step
 * keeps its original content and the run moves on to the next one.
 */

use std::time::{Duration, Instant};

use log::log;

use crate::book::{BookDocument, Chapter};
use crate::errors::{ChapterError, TranslationError};
use crate::translation::batch::{BatchStats, BatchTranslate};
use crate::translation::extraction::ChapterExtraction;

use super::progress::{ProgressSink, Severity};

/// What happened to one chapter that was not skipped
#[derive(Debug)]
pub enum ChapterOutcome {
    /// No translatable text
    Untouched,
    /// Content replaced; `failure` is set when some units kept their source text
    Translated {
        units: usize,
        stats: BatchStats,
        failure: Option<TranslationError>,
    },
}

/// A chapter left as it was because processing failed
#[derive(Debug)]
pub struct SkippedChapter {
    pub name: String,
    pub error: ChapterError,
}

/// Summary of a document run
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Chapters visited
    pub chapters_total: usize,
    /// Chapters whose content was rewritten
    pub chapters_translated: usize,
    /// Chapters without translatable text
    pub chapters_untouched: usize,
    /// Chapters where the translator failed and units fell back to source text
    pub degraded: Vec<String>,
    /// Chapters kept unchanged after an error
    pub skipped: Vec<SkippedChapter>,
    /// Per-unit counts over all translated chapters
    pub units: BatchStats,
    /// Wall time of the run
    pub duration: Duration,
}

impl PipelineReport {
    /// Whether every chapter went through without skips or fallbacks
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.degraded.is_empty()
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} chapters: {} translated, {} without text, {} skipped, {} degraded | units: {} translated, {} from memory, {} untranslated | {:.1}s",
            self.chapters_total,
            self.chapters_translated,
            self.chapters_untouched,
            self.skipped.len(),
            self.degraded.len(),
            self.units.translated,
            self.units.cache_hits,
            self.units.fallback,
            self.duration.as_secs_f64()
        )
    }
}

/// Runs extraction, batch translation and reassembly over a document
pub struct DocumentPipeline<'a> {
    translator: &'a dyn BatchTranslate,
    sink: Option<&'a dyn ProgressSink>,
}

impl<'a> DocumentPipeline<'a> {
    /// Create a pipeline that reports only through the log
    pub fn new(translator: &'a dyn BatchTranslate) -> Self {
        Self {
            translator,
            sink: None,
        }
    }

    /// Also send progress events to `sink`
    pub fn with_sink(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Translate every chapter of `document` in place
    pub fn process(&self, document: &mut BookDocument) -> PipelineReport {
        let start_time = Instant::now();
        let chapters = document.chapters_mut();
        let total = chapters.len();
        let mut report = PipelineReport {
            chapters_total: total,
            ..Default::default()
        };

        for (idx, chapter) in chapters.iter_mut().enumerate() {
            let position = idx + 1;
            let name = chapter.name().to_string();
            self.emit(
                &format!("Chapter {}/{}: {}", position, total, name),
                Severity::Info,
            );

            match self.process_chapter(chapter) {
                Ok(ChapterOutcome::Untouched) => {
                    report.chapters_untouched += 1;
                    self.emit(
                        &format!("Chapter {}/{} has no translatable text", position, total),
                        Severity::Info,
                    );
                }
                Ok(ChapterOutcome::Translated {
                    units,
                    stats,
                    failure,
                }) => {
                    report.chapters_translated += 1;
                    report.units.merge(&stats);
                    if let Some(e) = failure {
                        self.emit(
                            &format!(
                                "Chapter {}: {} of {} units left untranslated ({})",
                                name, stats.fallback, units, e
                            ),
                            Severity::Warn,
                        );
                        report.degraded.push(name);
                    }
                    self.emit(
                        &format!(
                            "Chapter {}/{} done: {} units ({} from memory)",
                            position, total, units, stats.cache_hits
                        ),
                        Severity::Info,
                    );
                }
                Err(error) => {
                    self.emit(
                        &format!("Skipping chapter {}, original kept: {}", name, error),
                        Severity::Warn,
                    );
                    report.skipped.push(SkippedChapter { name, error });
                }
            }

            if let Some(sink) = self.sink {
                sink.advance(position, total);
            }
        }

        report.duration = start_time.elapsed();
        self.emit(&report.summary(), Severity::Info);
        report
    }

    /// Process one chapter; its parse state lives only inside this call
    pub fn process_chapter(&self, chapter: &mut Chapter) -> Result<ChapterOutcome, ChapterError> {
        let extraction = ChapterExtraction::extract(chapter.get_content())?;
        if extraction.is_empty() {
            return Ok(ChapterOutcome::Untouched);
        }

        let units = extraction.len();
        let outcome = self.translator.translate_batch(&extraction.sources());
        if outcome.translations.len() != units {
            return Err(TranslationError::CountMismatch {
                expected: units,
                actual: outcome.translations.len(),
            }
            .into());
        }

        let content = extraction.reassemble(&outcome.translations)?;
        chapter.set_content(content);

        Ok(ChapterOutcome::Translated {
            units,
            stats: outcome.stats,
            failure: outcome.failure,
        })
    }

    fn emit(&self, message: &str, severity: Severity) {
        log!(severity.level(), "{}", message);
        if let Some(sink) = self.sink {
            sink.emit(message, severity);
        }
    }
}

/// Translate `document` in place with an optional progress sink
pub fn process(
    document: &mut BookDocument,
    translator: &dyn BatchTranslate,
    sink: Option<&dyn ProgressSink>,
) -> PipelineReport {
    let pipeline = DocumentPipeline::new(translator);
    match sink {
        Some(sink) => pipeline.with_sink(sink).process(document),
        None => pipeline.process(document),
    }
}

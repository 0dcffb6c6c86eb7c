/*!
 * Batch translation.
 *
 * Resolves an ordered list of text units against the translation memory,
 * sends the misses to the translator in one call and merges everything back
 * in input order. Glossary corrections are applied to cached and fresh
 * translations alike; the memory always stores the raw translator output.
 */

use log::{debug, warn};

use crate::errors::TranslationError;

use super::cache::{TranslationMemory, normalize};
use super::core::{TranslationSession, Translator};
use super::glossary::GlossaryCorrector;

/// Where each unit of a batch came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Empty or whitespace-only units returned as-is
    pub passthrough: usize,
    /// Units answered from the translation memory
    pub cache_hits: usize,
    /// Units translated by the translator
    pub translated: usize,
    /// Units left untranslated because the translator failed
    pub fallback: usize,
}

impl BatchStats {
    /// Add another batch's counts to this one
    pub fn merge(&mut self, other: &BatchStats) {
        self.passthrough += other.passthrough;
        self.cache_hits += other.cache_hits;
        self.translated += other.translated;
        self.fallback += other.fallback;
    }

    /// Total number of units
    pub fn total(&self) -> usize {
        self.passthrough + self.cache_hits + self.translated + self.fallback
    }
}

/// Result of translating one batch
///
/// `translations` always has one entry per input unit. When the translator
/// failed, `failure` holds the reason and the affected units carry their
/// original text.
#[derive(Debug)]
pub struct BatchOutcome {
    pub translations: Vec<String>,
    pub stats: BatchStats,
    pub failure: Option<TranslationError>,
}

impl BatchOutcome {
    /// Whether some units fell back to their source text
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Ordered batch translation as seen by the pipeline
pub trait BatchTranslate {
    /// Translate `units`, returning exactly one result per unit in the same order
    fn translate_batch(&self, units: &[String]) -> BatchOutcome;
}

/// Cache-first batch translator
pub struct BatchOrchestrator<'a> {
    translator: &'a dyn Translator,
    memory: Option<&'a TranslationMemory>,
    glossary: &'a GlossaryCorrector,
}

impl<'a> BatchOrchestrator<'a> {
    /// Create an orchestrator over borrowed collaborators
    pub fn new(
        translator: &'a dyn Translator,
        memory: Option<&'a TranslationMemory>,
        glossary: &'a GlossaryCorrector,
    ) -> Self {
        Self {
            translator,
            memory,
            glossary,
        }
    }

    fn store(&self, source: &str, raw: &str) {
        if let Some(memory) = self.memory {
            if let Err(e) = memory.save(source, raw) {
                warn!("Translation not cached: {}", e);
            }
        }
    }
}

impl BatchTranslate for BatchOrchestrator<'_> {
    fn translate_batch(&self, units: &[String]) -> BatchOutcome {
        let mut results: Vec<Option<String>> = vec![None; units.len()];
        let mut pending_indices = Vec::new();
        let mut pending_sources = Vec::new();
        let mut stats = BatchStats::default();

        for (idx, unit) in units.iter().enumerate() {
            let source = normalize(unit);
            if source.is_empty() {
                results[idx] = Some(unit.clone());
                stats.passthrough += 1;
                continue;
            }

            if let Some(cached) = self.memory.and_then(|memory| memory.get(source)) {
                results[idx] = Some(self.glossary.apply_post_correction(&cached));
                stats.cache_hits += 1;
                continue;
            }

            pending_indices.push(idx);
            pending_sources.push(source.to_string());
        }

        let mut failure = None;
        if !pending_sources.is_empty() {
            debug!(
                "Translating {} units ({} from memory)",
                pending_sources.len(),
                stats.cache_hits
            );

            let translated = self
                .translator
                .translate(&pending_sources)
                .and_then(|translations| {
                    if translations.len() == pending_sources.len() {
                        Ok(translations)
                    } else {
                        Err(TranslationError::CountMismatch {
                            expected: pending_sources.len(),
                            actual: translations.len(),
                        })
                    }
                });

            match translated {
                Ok(translations) => {
                    for ((idx, source), raw) in pending_indices
                        .iter()
                        .zip(&pending_sources)
                        .zip(&translations)
                    {
                        self.store(source, raw);
                        results[*idx] = Some(self.glossary.apply_post_correction(raw));
                    }
                    stats.translated += translations.len();
                }
                Err(e) => {
                    warn!(
                        "Batch of {} units left untranslated: {}",
                        pending_sources.len(),
                        e
                    );
                    for &idx in &pending_indices {
                        results[idx] = Some(units[idx].clone());
                    }
                    stats.fallback += pending_indices.len();
                    failure = Some(e);
                }
            }
        }

        let translations = results
            .into_iter()
            .zip(units)
            .map(|(result, unit)| result.unwrap_or_else(|| unit.clone()))
            .collect();

        BatchOutcome {
            translations,
            stats,
            failure,
        }
    }
}

impl BatchTranslate for TranslationSession {
    fn translate_batch(&self, units: &[String]) -> BatchOutcome {
        self.orchestrator().translate_batch(units)
    }
}

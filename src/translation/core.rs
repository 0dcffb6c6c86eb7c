/*!
 * Core translation types.
 *
 * - `Translator`: the batch translation capability the pipeline depends on
 * - `TranslationSession`: translator, memory and glossary for one job
 * - `TranslationService`: a `Translator` backed by an Ollama chat model
 */

use std::ops::Range;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::runtime::Handle;

use crate::app_config::Config;
use crate::errors::{CacheError, TranslationError};
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::ollama::{ChatMessage, ChatRequest, Ollama};

use super::batch::BatchOrchestrator;
use super::cache::{MemoryStats, TranslationMemory};
use super::glossary::GlossaryCorrector;

/// Batch translation capability
///
/// Returns one translation per input, in input order, or fails as a unit.
pub trait Translator {
    /// Translate every text in `texts`
    fn translate(&self, texts: &[String]) -> Result<Vec<String>, TranslationError>;
}

impl<F> Translator for F
where
    F: Fn(&[String]) -> Result<Vec<String>, TranslationError>,
{
    fn translate(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        self(texts)
    }
}

/// Everything a document job translates with, built once and borrowed by the pipeline
pub struct TranslationSession {
    translator: Box<dyn Translator>,
    memory: Option<TranslationMemory>,
    glossary: GlossaryCorrector,
}

impl TranslationSession {
    /// Create a session; `memory` is `None` when caching is disabled
    pub fn new(
        translator: Box<dyn Translator>,
        memory: Option<TranslationMemory>,
        glossary: GlossaryCorrector,
    ) -> Self {
        Self {
            translator,
            memory,
            glossary,
        }
    }

    /// Orchestrator borrowing this session's collaborators
    pub fn orchestrator(&self) -> BatchOrchestrator<'_> {
        BatchOrchestrator::new(self.translator.as_ref(), self.memory.as_ref(), &self.glossary)
    }

    /// The translation memory, if enabled
    pub fn memory(&self) -> Option<&TranslationMemory> {
        self.memory.as_ref()
    }

    /// The glossary rules in use
    pub fn glossary(&self) -> &GlossaryCorrector {
        &self.glossary
    }

    /// End the session, closing the memory; returns its final statistics
    pub fn close(self) -> Result<Option<MemoryStats>, CacheError> {
        match self.memory {
            Some(memory) => {
                let stats = memory.stats();
                memory.close()?;
                Ok(Some(stats))
            }
            None => Ok(None),
        }
    }
}

/// Entry marker in packed prompts
static ENTRY_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<ENTRY_(\d+)>>").expect("Invalid entry marker regex"));

/// End marker constant
const END_MARKER: &str = "<<END>>";

/// Options for the remote translation service
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Model name
    pub model: String,
    /// System prompt with languages filled in
    pub system_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum source characters packed into one request
    pub max_chars_per_request: usize,
    /// Upper bound on a single request, including retries
    pub timeout: Duration,
}

impl TranslationOptions {
    /// Derive options from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let source_name = language_utils::get_language_name(&config.source_language)?;
        let target_name = language_utils::get_language_name(&config.target_language)?;
        let common = &config.translation.common;
        let provider = &config.translation.provider;

        Ok(Self {
            model: provider.model.clone(),
            system_prompt: common
                .system_prompt
                .replace("{source_language}", &source_name)
                .replace("{target_language}", &target_name),
            temperature: common.temperature,
            max_chars_per_request: common.max_chars_per_request.max(1),
            timeout: Duration::from_secs(provider.timeout_secs),
        })
    }
}

/// Translator that packs units into marked prompts for an Ollama model
pub struct TranslationService {
    provider: Ollama,
    options: TranslationOptions,
    runtime: Handle,
}

impl TranslationService {
    /// Create the service from configuration
    ///
    /// `runtime` drives the HTTP calls; `translate` must be called from a
    /// thread that is not itself running async tasks (e.g. `spawn_blocking`).
    pub fn new(config: &Config, runtime: Handle) -> Result<Self> {
        let options = TranslationOptions::from_config(config)?;
        let provider_config = &config.translation.provider;
        let provider = Ollama::new(
            provider_config.endpoint.clone(),
            options.timeout,
            provider_config.max_retries,
            provider_config.retry_backoff_ms,
        );

        info!(
            "Translation service ready: model '{}' at {}",
            options.model,
            provider.base_url()
        );

        Ok(Self {
            provider,
            options,
            runtime,
        })
    }

    /// Check that the provider answers
    pub fn test_connection(&self) -> Result<(), TranslationError> {
        self.runtime
            .block_on(self.provider.test_connection())
            .map_err(TranslationError::from)
    }

    fn translate_request(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        let prompt = format!(
            "Translate the text between the markers below. Keep every <<ENTRY_n>> marker and the final {} marker exactly as they are, in the same order, and output nothing else.\n\n{}",
            END_MARKER,
            build_marked_text(texts)
        );
        let request = ChatRequest::new(
            self.options.model.clone(),
            vec![
                ChatMessage::system(self.options.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
        )
        .temperature(self.options.temperature)
        .no_stream();

        let timeout = self.options.timeout;
        let response = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, self.provider.complete(request)).await })
            .map_err(|_| TranslationError::Timeout(timeout.as_secs()))??;

        split_marked_text(&Ollama::extract_text(&response), texts.len())
    }
}

impl Translator for TranslationService {
    fn translate(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        let mut translations = Vec::with_capacity(texts.len());
        let chunks = chunk_ranges(texts, self.options.max_chars_per_request);
        let total = chunks.len();

        for (index, range) in chunks.into_iter().enumerate() {
            debug!(
                "Sending request {}/{} ({} units)",
                index + 1,
                total,
                range.len()
            );
            translations.extend(self.translate_request(&texts[range])?);
        }

        Ok(translations)
    }
}

/// Pack texts into one marked block
pub fn build_marked_text(texts: &[String]) -> String {
    let mut combined = String::new();
    for (idx, text) in texts.iter().enumerate() {
        combined.push_str(&format!("<<ENTRY_{}>>\n", idx));
        combined.push_str(text);
        combined.push('\n');
    }
    combined.push_str(END_MARKER);
    combined
}

/// Split a marked block back into `expected` texts
///
/// Every entry marker must be present, in order, followed by the end marker.
pub fn split_marked_text(response: &str, expected: usize) -> Result<Vec<String>, TranslationError> {
    let end_pos = response
        .rfind(END_MARKER)
        .ok_or_else(|| TranslationError::MalformedResponse("missing end marker".to_string()))?;
    let body = &response[..end_pos];

    let markers: Vec<(usize, usize, usize)> = ENTRY_MARKER_REGEX
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let index = cap.get(1)?.as_str().parse().ok()?;
            Some((index, whole.start(), whole.end()))
        })
        .collect();

    if markers.len() != expected {
        return Err(TranslationError::CountMismatch {
            expected,
            actual: markers.len(),
        });
    }

    let mut texts = Vec::with_capacity(expected);
    for (position, &(index, _, text_start)) in markers.iter().enumerate() {
        if index != position {
            return Err(TranslationError::MalformedResponse(format!(
                "entry marker {} found where {} was expected",
                index, position
            )));
        }
        let text_end = markers
            .get(position + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(body.len());
        texts.push(body[text_start..text_end].trim().to_string());
    }

    Ok(texts)
}

/// Group consecutive texts so each group stays within `max_chars`
///
/// A single text longer than the limit gets a group of its own.
pub fn chunk_ranges(texts: &[String], max_chars: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (idx, text) in texts.iter().enumerate() {
        let len = text.chars().count();
        if idx > start && chars + len > max_chars {
            ranges.push(start..idx);
            start = idx;
            chars = 0;
        }
        chars += len;
    }
    if start < texts.len() {
        ranges.push(start..texts.len());
    }

    ranges
}

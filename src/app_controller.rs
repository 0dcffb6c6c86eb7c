use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::book::BookCodec;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::translation::cache::{MemoryStats, TranslationMemory};
use crate::translation::core::{TranslationService, TranslationSession, Translator};
use crate::translation::glossary::GlossaryCorrector;
use crate::translation::pipeline::{DocumentPipeline, PipelineReport, ProgressSink, Severity};

// @module: Application controller for book translation jobs

/// Outcome of one completed job
#[derive(Debug)]
pub struct JobSummary {
    /// Where the translated book was written
    pub output_path: PathBuf,
    /// Per-chapter results
    pub report: PipelineReport,
    /// Translation memory counters, when the memory was enabled
    pub memory: Option<MemoryStats>,
    /// Total wall time
    pub elapsed: Duration,
}

/// Main application controller for book translation
#[derive(Debug, Clone)]
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        if language_utils::language_codes_match(&config.source_language, &config.target_language) {
            warn!(
                "Source and target language are both '{}'",
                config.target_language
            );
        }

        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the translated book goes when no output is given
    pub fn default_output_path(&self, input_path: &Path) -> PathBuf {
        FileManager::generate_output_path(input_path, &self.config.target_language)
    }

    /// Translate the book at `input_path` with the configured Ollama model
    ///
    /// The job itself is synchronous; it runs on a blocking thread while this
    /// runtime drives the HTTP calls.
    pub async fn run(
        &self,
        input_path: PathBuf,
        output_path: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<JobSummary> {
        let controller = self.clone();
        let runtime = tokio::runtime::Handle::current();

        tokio::task::spawn_blocking(move || {
            let service = TranslationService::new(&controller.config, runtime)?;
            service
                .test_connection()
                .map_err(AppError::from)
                .with_context(|| {
                    format!(
                        "Cannot reach the translation model at {}",
                        controller.config.translation.provider.endpoint
                    )
                })?;

            let sink = ProgressBarSink::new();
            let result = controller.run_with_translator(
                &input_path,
                output_path,
                force_overwrite,
                Box::new(service),
                Some(&sink),
            );
            sink.finish();
            result
        })
        .await
        .context("Translation job panicked")?
    }

    /// Run a whole job with the given translator
    pub fn run_with_translator(
        &self,
        input_path: &Path,
        output_path: Option<PathBuf>,
        force_overwrite: bool,
        translator: Box<dyn Translator>,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<JobSummary> {
        let start_time = Instant::now();
        let output_path = output_path.unwrap_or_else(|| self.default_output_path(input_path));
        self.prepare_output(input_path, &output_path, force_overwrite)?;

        let memory = if self.config.cache.enabled {
            let cache_path = self.config.cache_path()?;
            let memory = TranslationMemory::open(&cache_path).map_err(AppError::from)?;
            info!("Translation memory: {:?}", cache_path);
            Some(memory)
        } else {
            info!("Translation memory disabled");
            None
        };

        let glossary = GlossaryCorrector::load(&self.config.glossary.path);
        let session = TranslationSession::new(translator, memory, glossary);

        let mut document = BookCodec::read(input_path).map_err(AppError::from)?;

        info!(
            "Translating {:?} ({} -> {})",
            input_path, self.config.source_language, self.config.target_language
        );
        let pipeline = DocumentPipeline::new(&session);
        let report = match sink {
            Some(sink) => pipeline.with_sink(sink).process(&mut document),
            None => pipeline.process(&mut document),
        };

        Self::clear_output(&output_path)?;
        if let Err(e) = BookCodec::write(&document, &output_path) {
            if let Some(sink) = sink {
                sink.emit(&format!("Failed to write book: {}", e), Severity::Error);
            }
            return Err(AppError::from(e).into());
        }

        let memory = match session.close() {
            Ok(stats) => stats,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        let elapsed = start_time.elapsed();
        if let Some(stats) = &memory {
            info!(
                "Translation memory: {} hits, {} misses ({:.0}% hit rate), {} new entries",
                stats.hits,
                stats.misses,
                stats.hit_rate() * 100.0,
                stats.writes
            );
        }
        for skipped in &report.skipped {
            warn!("Chapter left untranslated: {} ({})", skipped.name, skipped.error);
        }
        info!(
            "Success: {:?} in {}",
            output_path,
            Self::format_duration(elapsed)
        );

        Ok(JobSummary {
            output_path,
            report,
            memory,
            elapsed,
        })
    }

    // @method: Check the output rules without touching the file system
    fn prepare_output(&self, input_path: &Path, output_path: &Path, force_overwrite: bool) -> Result<()> {
        if !FileManager::dir_exists(input_path) {
            return Err(anyhow!("Input book directory does not exist: {:?}", input_path));
        }

        if same_path(input_path, output_path) {
            return Err(anyhow!("Output path must differ from the input: {:?}", output_path));
        }

        if output_path.exists() && !force_overwrite {
            return Err(anyhow!(
                "Output already exists: {:?} (use --force to overwrite)",
                output_path
            ));
        }

        Ok(())
    }

    // @method: Remove a previous output; only called once the new book is ready to write
    fn clear_output(output_path: &Path) -> Result<()> {
        if !output_path.exists() {
            return Ok(());
        }

        warn!("Overwriting existing output: {:?}", output_path);
        if output_path.is_dir() {
            std::fs::remove_dir_all(output_path)
        } else {
            std::fs::remove_file(output_path)
        }
        .with_context(|| format!("Failed to remove existing output: {:?}", output_path))
    }

    fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Terminal progress bar over chapters
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    /// Create a bar; its length is set by the first progress update
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chapters ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        Self { bar }
    }

    /// Stop drawing the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressBarSink {
    fn emit(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => self.bar.set_message(message.to_string()),
            Severity::Warn | Severity::Error => {
                self.bar.set_message(format!("[{}] {}", severity, message))
            }
        }
    }

    fn advance(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}

use anyhow::{anyhow, Context, Result};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::database::DatabaseConnection;

/// Upper bound on provider retries
pub const MAX_RETRIES: u32 = 10;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Translation memory config
    #[serde(default)]
    pub cache: CacheConfig,

    /// Glossary config
    #[serde(default)]
    pub glossary: GlossaryConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslationConfig {
    /// Model server settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Ollama server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    // @field: Upper bound on one translation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries for transient failures
    #[serde(default = "default_retry_count")]
    pub max_retries: u32,

    // @field: Base backoff, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Common translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum source characters sent in one request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_chars_per_request: default_max_chars_per_request(),
        }
    }
}

/// Translation memory configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether to read and write the translation memory
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Database file; defaults to a per-language-pair file in the user data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Glossary configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlossaryConfig {
    /// JSON file of term -> replacement
    #[serde(default = "default_glossary_path")]
    pub path: PathBuf,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            path: default_glossary_path(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` crate
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_max_chars_per_request() -> usize {
    2000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_glossary_path() -> PathBuf {
    PathBuf::from("data").join("glossary.json")
}

fn default_system_prompt() -> String {
    "You are a professional literary translator. Translate the following book text from {source_language} to {target_language}. Preserve the meaning, tone and punctuation of the original and do not add explanations.".to_string()
}

impl Config {
    /// Load configuration from `path`, writing a default file if none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        let provider = &self.translation.provider;
        let endpoint = url::Url::parse(&provider.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", provider.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Provider endpoint must use http or https: {}",
                provider.endpoint
            ));
        }

        if provider.model.trim().is_empty() {
            return Err(anyhow!("A model name is required"));
        }

        if provider.max_retries > MAX_RETRIES {
            return Err(anyhow!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES,
                provider.max_retries
            ));
        }

        if provider.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than zero"));
        }

        let common = &self.translation.common;
        if common.max_chars_per_request == 0 {
            return Err(anyhow!("max_chars_per_request must be greater than zero"));
        }

        if !(0.0..=2.0).contains(&common.temperature) {
            return Err(anyhow!(
                "temperature must be between 0.0 and 2.0, got {}",
                common.temperature
            ));
        }

        Ok(())
    }

    /// Location of the translation memory for this language pair
    pub fn cache_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache.path {
            return Ok(path.clone());
        }

        DatabaseConnection::default_database_path(&format!(
            "translation_memory_{}_{}.db",
            self.source_language.to_lowercase(),
            self.target_language.to_lowercase()
        ))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            cache: CacheConfig::default(),
            glossary: GlossaryConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

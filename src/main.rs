// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use booktrans::app_config::{self, Config};
use booktrans::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for booktrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// booktrans - translate unpacked e-books with a local LLM
///
/// Every chapter of the book is translated text unit by text unit, reusing
/// earlier translations from a translation memory and applying glossary
/// corrections to the result.
#[derive(Parser, Debug)]
#[command(name = "booktrans")]
#[command(version)]
#[command(about = "E-book translation with a translation memory and glossary")]
#[command(long_about = "booktrans translates the chapters of an unpacked e-book directory with an Ollama model.

EXAMPLES:
    booktrans my_book/                          # Writes my_book_ES/ using conf.json
    booktrans -o out/ my_book/                  # Choose the output directory
    booktrans -f my_book/                       # Overwrite an existing output
    booktrans -s en -t fr my_book/              # Translate from English to French
    booktrans --no-cache my_book/               # Ignore the translation memory
    booktrans -g terms.json my_book/            # Use a different glossary
    booktrans completions bash > booktrans.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Unpacked book directory to translate
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory (default: INPUT_PATH_<TARGET>)
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: Option<PathBuf>,

    /// Force overwrite of an existing output
    #[arg(short, long)]
    force: bool,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Disable the translation memory
    #[arg(long)]
    no_cache: bool,

    /// Glossary file (JSON object of term -> replacement)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    /// Override configuration values given on the command line
    fn apply_to(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.translation.provider.model = model.clone();
        }
        if let Some(source_lang) = &self.source_language {
            config.source_language = source_lang.clone();
        }
        if let Some(target_lang) = &self.target_language {
            config.target_language = target_lang.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(glossary) = &self.glossary {
            config.glossary.path = glossary.clone();
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level.into();
        }
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger accepts everything; log::max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label and ANSI colour for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (label, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                label,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "booktrans", &mut std::io::stdout());
        return Ok(());
    }

    // Apply a command line log level before the config is read
    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let input_path = cli
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    let mut config = Config::load_or_create(&cli.config)?;
    cli.apply_to(&mut config);
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(input_path, cli.output.clone(), cli.force)
        .await?;

    let report = &summary.report;
    if !report.is_complete() {
        warn!(
            "{} chapter(s) skipped, {} chapter(s) partly untranslated",
            report.skipped.len(),
            report.degraded.len()
        );
    }
    info!("{}", report.summary());

    Ok(())
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde_json::json;

use crate::app_config::Config;
use crate::documents::DocumentPipeline;
use crate::errors::AppError;
use crate::translation::TranslationService;

mod app_config;
mod cache;
mod documents;
mod errors;
mod file_utils;
mod glossary;
mod providers;
mod text;
mod translation;

/// CLI wrapper for the log level
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Translate a document file, preserving its structure.
///
/// Prints a single JSON result object to stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "doctrans", version, about)]
struct CommandLineOptions {
    /// Input document (.txt, .md, .json, .xml, .docx)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output path for the translated document
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Source language
    #[arg(short = 's', long)]
    source_lang: Option<String>,

    /// Target language
    #[arg(short = 't', long)]
    target_lang: Option<String>,

    /// JSON configuration file; command line flags override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Provider registry file
    #[arg(long)]
    providers_file: Option<PathBuf>,

    /// Provider id to use; the registry's first entry when omitted
    #[arg(short = 'p', long)]
    provider_id: Option<String>,

    /// Glossary file
    #[arg(short = 'g', long)]
    glossary: Option<PathBuf>,

    /// Disable glossary term handling even when a glossary is configured
    #[arg(long)]
    no_glossary: bool,

    /// Prompt overrides file
    #[arg(long)]
    prompts_file: Option<PathBuf>,

    /// Key selecting the prompt template in the prompts file
    #[arg(long)]
    prompt_key: Option<String>,

    /// Path of the SQLite translation cache
    #[arg(long)]
    cache_db: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Concurrent chunk requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Merge consecutive short paragraphs before chunking
    #[arg(long)]
    merge_short: bool,

    /// Minimum merged segment size in characters
    #[arg(long)]
    merge_min_chars: Option<usize>,

    /// Normalize whitespace when hashing chunks for cache lookups
    #[arg(long)]
    normalize_whitespace: bool,

    /// Skip the provider; every chunk translates to itself
    #[arg(long)]
    dry_run: bool,

    /// Retries after a transient failure
    #[arg(long)]
    max_retries: Option<u32>,

    /// Log verbosity
    #[arg(long, value_enum, default_value = "warn")]
    log_level: CliLogLevel,
}

impl CommandLineOptions {
    /// Build the effective configuration: file base, then flag overrides
    fn into_config(self) -> Result<(Config, PathBuf, PathBuf), AppError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(lang) = self.source_lang {
            config.source_language = lang;
        }
        if let Some(lang) = self.target_lang {
            config.target_language = lang;
        }
        if let Some(path) = self.providers_file {
            config.providers_file = path;
        }
        if self.provider_id.is_some() {
            config.provider_id = self.provider_id;
        }
        if self.glossary.is_some() {
            config.glossary_file = self.glossary;
        }
        if self.no_glossary {
            config.glossary_enabled = false;
        }
        if self.prompts_file.is_some() {
            config.prompts_file = self.prompts_file;
        }
        if let Some(key) = self.prompt_key {
            config.prompt_key = key;
        }
        if self.cache_db.is_some() {
            config.cache_db = self.cache_db;
        }
        if let Some(max_chars) = self.max_chars {
            config.pipeline.max_chars = max_chars;
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if self.merge_short {
            config.pipeline.merge_short_segments = true;
        }
        if let Some(min_chars) = self.merge_min_chars {
            config.pipeline.merge_min_chars = min_chars;
        }
        if self.normalize_whitespace {
            config.pipeline.normalize_whitespace = true;
        }
        if self.dry_run {
            config.pipeline.dry_run = true;
        }
        if let Some(retries) = self.max_retries {
            config.pipeline.retry.max_retries = retries;
        }

        config.validate()?;
        Ok((config, self.input, self.output))
    }
}

/// Stderr logger with timestamps and level colors
struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(StderrLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLineOptions::parse();
    if StderrLogger::init(cli.log_level.into()).is_err() {
        eprintln!("Failed to initialize logger");
    }

    match run(cli).await {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let envelope = json!({
                "ok": false,
                "error": err.to_string(),
                "type": err.kind(),
            });
            println!("{}", envelope);
            ExitCode::from(2)
        }
    }
}

/// Execute one file translation and render the report as JSON
async fn run(cli: CommandLineOptions) -> Result<String, AppError> {
    let (config, input, output) = cli.into_config()?;

    let service = TranslationService::from_config(&config)?;
    let pipeline = DocumentPipeline::new(service);
    let report = pipeline.translate_file(&input, &output).await?;

    serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::Unknown(format!("cannot render report: {}", e)))
}

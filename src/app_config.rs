/*!
 * Application configuration management.
 *
 * Holds the runtime configuration of the translation pipeline, loadable
 * from a JSON file and adjustable from the command line. Out-of-range
 * numeric values are clamped to safe bounds rather than rejected.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Bounds for the chunk size budget, in characters
const MAX_CHARS_RANGE: (usize, usize) = (200, 20_000);
/// Bounds for concurrent in-flight chunk requests
const CONCURRENCY_RANGE: (usize, usize) = (1, 16);
/// Bounds for the short-segment merge threshold, in characters
const MERGE_MIN_CHARS_RANGE: (usize, usize) = (50, 2_000);
/// Bounds for the retry count
const MAX_RETRIES_RANGE: (u32, u32) = (0, 6);
/// Bounds for the base backoff delay, in milliseconds
const BACKOFF_BASE_MS_RANGE: (u64, u64) = (100, 10_000);

/// Retry and backoff behaviour for transient provider failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay before the first retry, in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Multiplier applied to the delay after each retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Retry count clamped to the accepted range
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries
            .clamp(MAX_RETRIES_RANGE.0, MAX_RETRIES_RANGE.1)
    }

    /// Base backoff delay clamped to the accepted range
    pub fn effective_backoff_base(&self) -> Duration {
        Duration::from_millis(
            self.backoff_base_ms
                .clamp(BACKOFF_BASE_MS_RANGE.0, BACKOFF_BASE_MS_RANGE.1),
        )
    }

    /// Backoff multiplier, never below 1.0
    pub fn effective_multiplier(&self) -> f64 {
        if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            default_backoff_multiplier()
        }
    }
}

/// Tuning knobs of the segmentation and dispatch pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Maximum chunk size sent in a single request, in characters
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Number of chunk requests allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Merge consecutive short segments before chunking
    #[serde(default)]
    pub merge_short_segments: bool,

    /// Minimum segment size targeted by the merge pass, in characters
    #[serde(default = "default_merge_min_chars")]
    pub merge_min_chars: usize,

    /// Normalize whitespace when hashing chunks for cache lookups
    #[serde(default)]
    pub normalize_whitespace: bool,

    /// Skip the provider entirely and return the input as its own translation
    #[serde(default)]
    pub dry_run: bool,

    /// Retry behaviour for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_chars: default_max_chars(),
            concurrency: default_concurrency(),
            merge_short_segments: false,
            merge_min_chars: default_merge_min_chars(),
            normalize_whitespace: false,
            dry_run: false,
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Chunk size budget clamped to the accepted range
    pub fn effective_max_chars(&self) -> usize {
        self.max_chars.clamp(MAX_CHARS_RANGE.0, MAX_CHARS_RANGE.1)
    }

    /// Concurrency clamped to the accepted range
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency
            .clamp(CONCURRENCY_RANGE.0, CONCURRENCY_RANGE.1)
    }

    /// Merge threshold clamped to the accepted range
    pub fn effective_merge_min_chars(&self) -> usize {
        self.merge_min_chars
            .clamp(MERGE_MIN_CHARS_RANGE.0, MERGE_MIN_CHARS_RANGE.1)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Source language of the input document
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language of the translation
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Path to the provider registry file
    #[serde(default = "default_providers_file")]
    pub providers_file: PathBuf,

    /// Identifier of the provider to use; falls back to the first entry
    #[serde(default)]
    pub provider_id: Option<String>,

    /// Optional glossary file
    #[serde(default)]
    pub glossary_file: Option<PathBuf>,

    /// Apply glossary term placeholders when a glossary is loaded
    #[serde(default = "default_true")]
    pub glossary_enabled: bool,

    /// Optional prompt overrides file
    #[serde(default)]
    pub prompts_file: Option<PathBuf>,

    /// Key selecting the prompt template inside the prompts file
    #[serde(default = "default_prompt_key")]
    pub prompt_key: String,

    /// Path of the SQLite cache database; a per-user default when unset
    #[serde(default)]
    pub cache_db: Option<PathBuf>,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            providers_file: default_providers_file(),
            provider_id: None,
            glossary_file: None,
            glossary_enabled: true,
            prompts_file: None,
            prompt_key: default_prompt_key(),
            cache_db: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidValue(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ConfigError::InvalidValue(format!("cannot parse config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate fields that cannot be repaired by clamping
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_language.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "sourceLanguage must not be empty".to_string(),
            ));
        }
        if self.target_language.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "targetLanguage must not be empty".to_string(),
            ));
        }
        if self.prompt_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "promptKey must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions for serde

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_providers_file() -> PathBuf {
    PathBuf::from("providers.json")
}

fn default_prompt_key() -> String {
    "documentTranslation".to_string()
}

fn default_max_chars() -> usize {
    1200
}

fn default_concurrency() -> usize {
    4
}

fn default_merge_min_chars() -> usize {
    200
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

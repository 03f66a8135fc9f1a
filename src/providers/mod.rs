/*!
 * Provider registry and the chat transport seam.
 *
 * Providers are declared in a JSON registry file; every entry targets an
 * OpenAI-compatible chat endpoint. The `ChatTransport` trait is the seam
 * between the orchestrator and the network, so tests can swap the real
 * client for a scripted double.
 */

pub mod openai;

use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ProviderError};
use openai::{ChatCompletion, ChatRequest};

/// Bounds for per-request timeouts, in milliseconds
const TIMEOUT_MS_RANGE: (u64, u64) = (1_000, 120_000);

/// Fallback per-request timeout, in milliseconds
const DEFAULT_TIMEOUT_MS: u64 = 12_000;

/// One entry of the provider registry file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Unique provider identifier
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub label: String,

    /// Endpoint family; only OpenAI-compatible endpoints are supported
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Whether requests must carry an API key
    #[serde(default)]
    pub requires_api_key: bool,

    /// Literal API key; prefer `api_key_env` in committed files
    #[serde(default)]
    pub api_key: String,

    /// Environment variable to read the API key from when `api_key` is empty
    #[serde(default)]
    pub api_key_env: String,

    /// Endpoint base URL, without the `/chat/completions` suffix
    #[serde(default)]
    pub base_url: String,

    /// Model name sent with every request
    #[serde(default)]
    pub model: String,

    /// Per-request timeout in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    #[serde(default, alias = "topP")]
    pub top_p: Option<f64>,
}

impl ProviderSpec {
    /// Per-request timeout clamped to the accepted range
    pub fn timeout(&self) -> Duration {
        let ms = self
            .timeout_ms
            .unwrap_or(DEFAULT_TIMEOUT_MS)
            .clamp(TIMEOUT_MS_RANGE.0, TIMEOUT_MS_RANGE.1);
        Duration::from_millis(ms)
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// The API key to authenticate with, if any.
    ///
    /// A literal key wins; otherwise the configured environment variable
    /// is consulted at call time.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        if !self.api_key_env.trim().is_empty() {
            if let Ok(value) = std::env::var(self.api_key_env.trim()) {
                if !value.trim().is_empty() {
                    return Some(value.trim().to_string());
                }
            }
        }
        None
    }

    /// Check that the provider can actually serve requests.
    ///
    /// Dry runs never contact the endpoint, so they skip these checks.
    pub fn check_available(&self, dry_run: bool) -> Result<(), ConfigError> {
        if dry_run {
            return Ok(());
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ProviderUnavailable {
                provider: self.id.clone(),
                reason: "baseUrl is empty".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ProviderUnavailable {
                provider: self.id.clone(),
                reason: "model is empty".to_string(),
            });
        }
        if self.requires_api_key && self.resolved_api_key().is_none() {
            return Err(ConfigError::ProviderUnavailable {
                provider: self.id.clone(),
                reason: format!(
                    "API key required but neither apiKey nor ${} is set",
                    if self.api_key_env.is_empty() {
                        "<apiKeyEnv unset>"
                    } else {
                        self.api_key_env.as_str()
                    }
                ),
            });
        }
        Ok(())
    }
}

/// Load the provider registry from a JSON file.
///
/// Entries without an id are dropped; duplicate ids (compared
/// case-insensitively) keep the first occurrence. File order is
/// preserved, so the first entry is the default provider.
pub fn load_providers<P: AsRef<Path>>(path: P) -> Result<Vec<ProviderSpec>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::InvalidProviders(format!("cannot read '{}': {}", path.display(), e))
    })?;
    let raw: Vec<serde_json::Value> = serde_json::from_str(&content).map_err(|e| {
        ConfigError::InvalidProviders(format!("cannot parse '{}': {}", path.display(), e))
    })?;

    let mut providers: Vec<ProviderSpec> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for value in raw {
        let spec: ProviderSpec = match serde_json::from_value(value) {
            Ok(spec) => spec,
            Err(e) => {
                warn!("Skipping malformed provider entry: {}", e);
                continue;
            }
        };
        if spec.id.trim().is_empty() {
            warn!("Skipping provider entry without id");
            continue;
        }
        let lowered = spec.id.to_lowercase();
        if seen.contains(&lowered) {
            warn!("Skipping duplicate provider id '{}'", spec.id);
            continue;
        }
        seen.push(lowered);
        providers.push(spec);
    }

    if providers.is_empty() {
        return Err(ConfigError::NoProvider(format!(
            "'{}' defines no usable provider",
            path.display()
        )));
    }
    Ok(providers)
}

/// Pick the provider to use: the requested id, or the first entry.
pub fn resolve_provider<'a>(
    providers: &'a [ProviderSpec],
    wanted: Option<&str>,
) -> Result<&'a ProviderSpec, ConfigError> {
    match wanted {
        Some(id) => providers
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| ConfigError::NoProvider(format!("no provider with id '{}'", id))),
        None => providers
            .first()
            .ok_or_else(|| ConfigError::NoProvider("provider list is empty".to_string())),
    }
}

/// The seam between the orchestrator and the network.
#[async_trait]
pub trait ChatTransport: Send + Sync + Debug {
    /// Send one chat completion request to the given provider.
    ///
    /// Implementations own their retry policy; a returned error is final.
    async fn chat(
        &self,
        provider: &ProviderSpec,
        request: ChatRequest,
    ) -> Result<ChatCompletion, ProviderError>;
}

fn default_kind() -> String {
    "openai".to_string()
}

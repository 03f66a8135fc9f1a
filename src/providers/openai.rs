/*!
 * OpenAI-compatible chat client.
 *
 * Speaks the `/chat/completions` dialect shared by OpenAI, LM Studio,
 * Ollama's compatibility layer and most self-hosted gateways. Transient
 * failures (429, retryable 5xx, network errors) are retried with
 * exponential backoff and jitter; everything else surfaces immediately.
 */

use async_trait::async_trait;
use log::{error, warn};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::RetryConfig;
use crate::errors::ProviderError;

use super::{ChatTransport, ProviderSpec};

/// One message of a chat exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role: "system", "user" or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// A system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// A user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name to use
    pub model: String,
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl ChatRequest {
    /// Build a request carrying the provider's model and sampling options
    pub fn for_provider(provider: &ProviderSpec, messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            model: provider.model.clone(),
            messages,
            temperature: provider.temperature,
            top_p: provider.top_p,
        }
    }
}

/// One completion choice in the response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
}

/// Token usage block of the response.
///
/// Some backends report `prompt_tokens`/`completion_tokens`, others
/// `input_tokens`/`output_tokens`; both spellings are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsagePayload {
    /// Tokens consumed by the prompt
    #[serde(default, alias = "input_tokens")]
    pub prompt_tokens: Option<u64>,
    /// Tokens generated in the completion
    #[serde(default, alias = "output_tokens")]
    pub completion_tokens: Option<u64>,
}

/// Chat completion response body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    /// Generated choices; the first one is used
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token usage, when the backend reports it
    #[serde(default)]
    pub usage: Option<UsagePayload>,
}

impl ChatCompletion {
    /// Content of the first choice
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }
}

/// HTTP client for OpenAI-compatible endpoints, with built-in retry
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    /// Underlying HTTP client
    client: Client,
    /// Retry behaviour for transient failures
    retry: RetryConfig,
}

impl OpenAiClient {
    /// Create a client with the given retry policy
    pub fn new(retry: RetryConfig) -> Self {
        OpenAiClient {
            client: Client::new(),
            retry,
        }
    }

    /// Delay before the next retry: exponential growth with +/- 20% jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.retry.effective_backoff_base().as_millis() as f64;
        let factor = self.retry.effective_multiplier().powi(attempt as i32);
        let jitter = rand::rng().random_range(0.8..1.2);
        Duration::from_millis((base * factor * jitter) as u64)
    }

    /// One request attempt, mapped to a typed provider error
    async fn send_once(
        &self,
        provider: &ProviderSpec,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        let url = format!("{}/chat/completions", provider.normalized_base_url());

        let mut builder = self
            .client
            .post(&url)
            .timeout(provider.timeout())
            .json(request);
        if let Some(key) = provider.resolved_api_key() {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let completion: ChatCompletion = response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;
            if completion.choices.is_empty() {
                return Err(ProviderError::ParseError(
                    "response carries no choices".to_string(),
                ));
            }
            return Ok(completion);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded(body));
        }
        Err(ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl ChatTransport for OpenAiClient {
    async fn chat(
        &self,
        provider: &ProviderSpec,
        request: ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        let max_retries = self.retry.effective_max_retries();
        let mut attempt = 0u32;

        loop {
            match self.send_once(provider, &request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_transient() && attempt < max_retries => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Provider '{}' transient failure ({}) - attempt {}/{}, retrying in {:?}",
                        provider.id,
                        err,
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        "Provider '{}' request failed after {} attempt(s): {}",
                        provider.id,
                        attempt + 1,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }
}

/*!
 * Mock chat transport for testing
 *
 * Implements the ChatTransport trait without any network access. Each
 * mock records the user text of every call, can fail a configured
 * number of times, delay individual calls to scramble completion order,
 * and transform the echoed text so tests can tell translated output
 * from input.
 */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use doctrans::errors::ProviderError;
use doctrans::providers::openai::{
    ChatChoice, ChatCompletion, ChatMessage, ChatRequest, UsagePayload,
};
use doctrans::providers::{ChatTransport, ProviderSpec};

/// Run markers as produced by the DOCX adapter
static RUN_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[RUN_\d{4}\]\]").unwrap());

/// Type of error to simulate
#[derive(Debug, Clone, Copy)]
pub enum MockErrorType {
    /// Connection error
    Connection,
    /// Rate limit error
    RateLimit,
    /// API error with a status code
    Api(u16),
}

impl MockErrorType {
    fn to_error(self) -> ProviderError {
        match self {
            MockErrorType::Connection => {
                ProviderError::ConnectionError("mock connection refused".to_string())
            }
            MockErrorType::RateLimit => {
                ProviderError::RateLimitExceeded("mock rate limit".to_string())
            }
            MockErrorType::Api(status) => ProviderError::ApiError {
                status_code: status,
                message: "mock api error".to_string(),
            },
        }
    }
}

/// How the mock turns input text into "translated" text
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    /// Echo the input unchanged
    Identity,
    /// Uppercase the input, making translation visible in asserts
    Uppercase,
    /// Uppercase and wrap the answer in stray whitespace
    UppercasePadded,
    /// Uppercase and drop every run marker, breaking the DOCX protocol
    DropRunMarkers,
}

/// Mock implementation of the chat transport
#[derive(Debug)]
pub struct MockTransport {
    /// User text of every call, in arrival order
    calls: Arc<Mutex<Vec<String>>>,
    /// Remaining calls that should fail before succeeding
    fail_remaining: Arc<Mutex<u32>>,
    /// Error returned while failing
    error_type: MockErrorType,
    /// Per-call delays, popped front to back
    delays_ms: Arc<Mutex<VecDeque<u64>>>,
    /// Text transformation applied to successful calls
    transform: Transform,
    /// Usage block attached to each successful response
    usage: Option<UsagePayload>,
}

impl MockTransport {
    /// A transport that echoes input unchanged
    pub fn identity() -> Self {
        Self::new(Transform::Identity)
    }

    /// A transport that uppercases input
    pub fn uppercase() -> Self {
        Self::new(Transform::Uppercase)
    }

    /// A transport that pads its answers with surrounding whitespace
    pub fn uppercase_padded() -> Self {
        Self::new(Transform::UppercasePadded)
    }

    /// A transport that mangles DOCX run markers
    pub fn marker_dropping() -> Self {
        Self::new(Transform::DropRunMarkers)
    }

    fn new(transform: Transform) -> Self {
        MockTransport {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_remaining: Arc::new(Mutex::new(0)),
            error_type: MockErrorType::Connection,
            delays_ms: Arc::new(Mutex::new(VecDeque::new())),
            transform,
            usage: Some(UsagePayload {
                prompt_tokens: Some(3),
                completion_tokens: Some(5),
            }),
        }
    }

    /// Fail the next `count` calls with the given error
    pub fn fail_next_calls(mut self, count: u32, error_type: MockErrorType) -> Self {
        self.fail_remaining = Arc::new(Mutex::new(count));
        self.error_type = error_type;
        self
    }

    /// Delay successive calls by the given milliseconds, in call order
    pub fn with_delays(self, delays_ms: &[u64]) -> Self {
        *self.delays_ms.lock().unwrap() = delays_ms.iter().copied().collect();
        self
    }

    /// Drop the usage block from responses
    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    /// Number of calls the mock has received
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// User text of every call so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn apply_transform(&self, text: &str) -> String {
        match self.transform {
            Transform::Identity => text.to_string(),
            Transform::Uppercase => text.to_uppercase(),
            Transform::UppercasePadded => format!("\n  {}  \n", text.to_uppercase()),
            Transform::DropRunMarkers => RUN_MARKER.replace_all(text, "").to_uppercase(),
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn chat(
        &self,
        _provider: &ProviderSpec,
        request: ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        let user_text = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(user_text.clone());

        let delay = self.delays_ms.lock().unwrap().pop_front();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        {
            let mut remaining = self.fail_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(self.error_type.to_error());
            }
        }

        Ok(ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: self.apply_transform(&user_text),
                },
            }],
            usage: self.usage.clone(),
        })
    }
}

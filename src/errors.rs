/*!
 * Error types for the doctrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Rate limits, retryable server statuses and connection errors are
    /// transient. Client errors and malformed responses are permanent and
    /// must surface immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => {
                matches!(status_code, 429 | 500 | 502 | 503 | 504)
            }
            Self::RequestFailed(_) | Self::ParseError(_) => false,
        }
    }
}

/// Errors caused by invalid or incomplete configuration.
///
/// These are raised before any translation work starts; the pipeline
/// fails fast rather than producing partial output.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The providers file could not be read or parsed
    #[error("Invalid providers file: {0}")]
    InvalidProviders(String),

    /// No usable provider definition was found
    #[error("No provider available: {0}")]
    NoProvider(String),

    /// A provider is selected but cannot be used as configured
    #[error("Provider '{provider}' is not usable: {reason}")]
    ProviderUnavailable {
        /// Identifier of the selected provider
        provider: String,
        /// Why the provider cannot be used
        reason: String,
    },

    /// The glossary file could not be read or parsed
    #[error("Invalid glossary file: {0}")]
    InvalidGlossary(String),

    /// A configuration value is out of its accepted range or malformed
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Errors that can occur while reading or rebuilding a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input file extension maps to no adapter
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document content could not be parsed
    #[error("Failed to parse '{file}': {message}")]
    Parse {
        /// Path or archive entry that failed
        file: String,
        /// Parser error detail
        message: String,
    },

    /// A DOCX container could not be opened or rebuilt
    #[error("Invalid document archive '{file}': {message}")]
    Archive {
        /// Path of the archive
        file: String,
        /// Archive error detail
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document parsing or reconstruction
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Stable machine-readable error category, used in the CLI error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "io",
            Self::Config(_) => "config",
            Self::Provider(_) => "provider",
            Self::Document(_) => "document",
            Self::Unknown(_) => "unknown",
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Keep the typed category when the chain bottoms out in one of ours
        match error.downcast::<ProviderError>() {
            Ok(provider) => Self::Provider(provider),
            Err(error) => match error.downcast::<DocumentError>() {
                Ok(document) => Self::Document(document),
                Err(error) => match error.downcast::<ConfigError>() {
                    Ok(config) => Self::Config(config),
                    Err(error) => Self::Unknown(error.to_string()),
                },
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

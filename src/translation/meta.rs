/*!
 * Usage accounting for translation runs.
 */

use serde::Serialize;

use crate::providers::openai::UsagePayload;

/// Token counts accumulated across provider calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Tokens consumed by prompts
    pub input_tokens: u64,
    /// Tokens generated by completions
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Fold another usage block into this one
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Convert a provider usage payload, treating absent counts as zero
    pub fn from_payload(payload: &UsagePayload) -> Self {
        TokenUsage {
            input_tokens: payload.prompt_tokens.unwrap_or(0),
            output_tokens: payload.completion_tokens.unwrap_or(0),
        }
    }
}

/// Counters describing one translation run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMeta {
    /// Chunks dispatched (including cache hits)
    pub chunks: u64,
    /// Chunks answered from the cache
    pub cached_chunks: u64,
    /// Translated string values (JSON documents)
    pub strings: u64,
    /// Translated paragraphs (DOCX documents)
    pub paragraphs: u64,
    /// Accumulated token usage
    pub usage: TokenUsage,
}

impl TranslationMeta {
    /// Fold another run's counters into this one
    pub fn absorb(&mut self, other: &TranslationMeta) {
        self.chunks += other.chunks;
        self.cached_chunks += other.cached_chunks;
        self.strings += other.strings;
        self.paragraphs += other.paragraphs;
        self.usage.add(other.usage);
    }
}

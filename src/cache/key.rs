/*!
 * Cache key derivation.
 *
 * A cache key is the SHA-256 digest of a pipe-joined tuple of the
 * translation context fields plus the digest of the input text. Any
 * change to the provider, model, language pair, glossary or prompt
 * yields a different key.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Runs of horizontal whitespace inside a line
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Hex-encoded SHA-256 of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Collapse insignificant whitespace while preserving line structure.
///
/// Each line keeps its original ending (`\n` or `\r\n`); trailing
/// whitespace is stripped and interior runs of spaces and tabs collapse
/// to a single space. Blank lines survive, so paragraph boundaries are
/// unaffected.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (core, ending) = if let Some(stripped) = line.strip_suffix("\r\n") {
            (stripped, "\r\n")
        } else if let Some(stripped) = line.strip_suffix('\n') {
            (stripped, "\n")
        } else {
            (line, "")
        };
        let trimmed = core.trim_end_matches([' ', '\t']);
        out.push_str(&HORIZONTAL_WS.replace_all(trimmed, " "));
        out.push_str(ending);
    }
    out
}

/// Context fields that participate in every cache key
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    /// Provider identifier
    pub provider_id: &'a str,
    /// Model name
    pub model: &'a str,
    /// Source language
    pub source_lang: &'a str,
    /// Target language
    pub target_lang: &'a str,
    /// Stable glossary digest
    pub glossary_hash: &'a str,
    /// Prompt identity string
    pub prompt_identity: &'a str,
}

/// Derive the cache key for one chunk of text.
///
/// When `normalize` is set the text digest is taken over the normalized
/// form, so whitespace-only edits map to the same key.
pub fn cache_key(context: &KeyContext<'_>, text: &str, normalize: bool) -> String {
    let text_digest = if normalize {
        sha256_hex(&normalize_whitespace(text))
    } else {
        sha256_hex(text)
    };
    let joined = [
        context.provider_id,
        context.model,
        context.source_lang,
        context.target_lang,
        context.glossary_hash,
        context.prompt_identity,
        &text_digest,
    ]
    .join("|");
    sha256_hex(&joined)
}

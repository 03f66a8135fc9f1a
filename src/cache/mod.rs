/*!
 * Content-addressed translation cache.
 *
 * Translations are keyed by a digest of everything that can change the
 * output: provider, model, language pair, glossary, prompt identity and
 * the (optionally normalized) input text. Results are stored in SQLite
 * so repeated runs reuse previous work.
 */

pub mod key;
pub mod store;

pub use key::{cache_key, normalize_whitespace, sha256_hex, KeyContext};
pub use store::{CacheRecord, TranslationCache};

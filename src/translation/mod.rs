/*!
 * Translation orchestration.
 *
 * The `core` module drives the pipeline for one piece of text: protect,
 * segment, dispatch chunks concurrently through the cache and transport,
 * then restore. `prompts` builds the system prompt and its identity
 * string; `meta` accumulates usage and chunk statistics.
 */

pub mod core;
pub mod meta;
pub mod prompts;

pub use core::{TextKind, TranslationService};
pub use meta::{TokenUsage, TranslationMeta};
pub use prompts::PromptTemplate;

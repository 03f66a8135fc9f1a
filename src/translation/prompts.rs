/*!
 * Prompt templates and prompt identity.
 *
 * The system prompt is part of the cache key: its identity string is a
 * version tag plus a short digest of the prompt text, so editing the
 * prompt (or bumping the version) invalidates cached translations made
 * with the old wording.
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;

use crate::cache::key::sha256_hex;
use crate::providers::openai::ChatMessage;

/// Bumped when prompt semantics change in a way the digest cannot see
pub const PROMPT_VERSION: &str = "v1";

/// Extra instruction appended when the text carries run markers
pub const RUN_MARKER_INSTRUCTION: &str =
    "The text contains markers like [[RUN_0001]]. Keep every marker exactly where it belongs \
     relative to the text around it. Never add, remove or reorder markers.";

/// A resolved system prompt and its cache-key identity
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// System message sent with every request
    pub system: String,
    /// Identity string participating in cache keys
    pub identity: String,
}

impl PromptTemplate {
    /// Wrap a system prompt, deriving its identity
    pub fn new(system: String) -> Self {
        let identity = prompt_identity(&system);
        PromptTemplate { system, identity }
    }

    /// Resolve the prompt for a language pair.
    ///
    /// When a prompts file is given and holds the requested key, its
    /// `system` lines are joined and used with the language placeholders
    /// (`{source_lang}`/`{target_lang}`, single or double braced)
    /// substituted; otherwise the built-in prompt applies. A missing or
    /// malformed prompts file logs a warning and falls back.
    pub fn resolve(
        source_lang: &str,
        target_lang: &str,
        prompts_file: Option<&Path>,
        prompt_key: &str,
    ) -> Self {
        if let Some(path) = prompts_file {
            if let Some(template) = load_prompt_template(path, prompt_key) {
                let system = template
                    .replace("{{source_lang}}", source_lang)
                    .replace("{{target_lang}}", target_lang)
                    .replace("{source_lang}", source_lang)
                    .replace("{target_lang}", target_lang);
                return PromptTemplate::new(system);
            }
        }
        PromptTemplate::new(default_system_prompt(source_lang, target_lang))
    }
}

/// Identity string: version tag and the first 10 hex digits of the
/// prompt digest
pub fn prompt_identity(system: &str) -> String {
    format!("{}:{}", PROMPT_VERSION, &sha256_hex(system)[..10])
}

/// Built-in system prompt
pub fn default_system_prompt(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a professional translation engine.\n\
         Translate the user's text from {} to {}.\n\
         Rules:\n\
         - Output ONLY the translated text, with no explanations.\n\
         - Preserve placeholders like {{{{T0001}}}} exactly as written.\n\
         - Preserve tokens like [[CODEBLOCK_0001]], [[HTMLBLOCK_0001]], [[INLINE_0001]] and [[URL_0001]] exactly as written.\n\
         - Keep the original formatting, line breaks and Markdown structure.",
        source_lang, target_lang
    )
}

/// The two-message exchange sent for every chunk
pub fn build_messages(system: &str, text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(system), ChatMessage::user(text)]
}

/// Load one template from a prompts file.
///
/// The file is a JSON object keyed by prompt name; each entry carries a
/// `system` array of lines, joined with newlines after dropping blank
/// lines.
fn load_prompt_template(path: &Path, key: &str) -> Option<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Cannot read prompts file '{}': {}", path.display(), e);
            return None;
        }
    };
    let templates: HashMap<String, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(templates) => templates,
        Err(e) => {
            warn!("Cannot parse prompts file '{}': {}", path.display(), e);
            return None;
        }
    };
    let lines = templates.get(key)?.get("system")?.as_array()?;
    let system = lines
        .iter()
        .filter_map(|line| line.as_str())
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if system.is_empty() {
        return None;
    }
    Some(system)
}

/*!
 * Glossary loading and stable hashing.
 *
 * A glossary pins terminology: each entry maps a source term to the exact
 * target term the translation must use. Synonym groups additionally rewrite
 * known variants back to a canonical form after translation. The glossary
 * content is hashed into a stable digest that participates in cache keys,
 * so changing the glossary invalidates previous cache entries.
 */

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::key::sha256_hex;
use crate::errors::ConfigError;

/// Glossary hash used when term handling is disabled
pub const DISABLED_GLOSSARY_HASH: &str = "disabled";

/// One source-to-target terminology mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlossaryEntry {
    /// Term as it appears in the source text
    pub source: String,
    /// Exact term to use in the translation
    pub target: String,
}

/// A canonical term and the wording variants to rewrite into it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynonymGroup {
    /// Form every variant is rewritten to
    pub canonical: String,
    /// Variants replaced after translation
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Matching behaviour toggles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryOptions {
    /// Match terms ignoring ASCII case
    #[serde(default)]
    pub case_insensitive: bool,
    /// Require word boundaries around alphanumeric ASCII terms
    #[serde(default)]
    pub word_boundary: bool,
}

/// Raw file shape: either a bare entry array or a full object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GlossaryFile {
    Entries(Vec<GlossaryEntry>),
    Full {
        #[serde(default)]
        entries: Vec<GlossaryEntry>,
        #[serde(default)]
        synonyms: Vec<SynonymGroup>,
        #[serde(default)]
        options: GlossaryOptions,
    },
}

/// A loaded glossary with its stable content hash
#[derive(Debug, Clone)]
pub struct Glossary {
    /// Terminology entries in file order
    pub entries: Vec<GlossaryEntry>,
    /// Synonym rewrite groups
    pub synonyms: Vec<SynonymGroup>,
    /// Matching options
    pub options: GlossaryOptions,
    /// Stable digest of the glossary content
    pub hash: String,
}

impl Glossary {
    /// A glossary that applies nothing, with the fixed disabled hash
    pub fn disabled() -> Self {
        Glossary {
            entries: Vec::new(),
            synonyms: Vec::new(),
            options: GlossaryOptions::default(),
            hash: DISABLED_GLOSSARY_HASH.to_string(),
        }
    }

    /// Build a glossary from already-parsed parts, computing the hash
    pub fn new(
        entries: Vec<GlossaryEntry>,
        synonyms: Vec<SynonymGroup>,
        options: GlossaryOptions,
    ) -> Self {
        let entries: Vec<GlossaryEntry> = entries
            .into_iter()
            .filter(|e| !e.source.trim().is_empty() && !e.target.trim().is_empty())
            .collect();
        let hash = stable_hash(&entries, &synonyms, &options);
        Glossary {
            entries,
            synonyms,
            options,
            hash,
        }
    }

    /// Load a glossary from a JSON file.
    ///
    /// Accepts either a bare array of entries or an object with `entries`,
    /// `synonyms` and `options` keys. Blank entries are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidGlossary(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let parsed: GlossaryFile = serde_json::from_str(&content).map_err(|e| {
            ConfigError::InvalidGlossary(format!("cannot parse '{}': {}", path.display(), e))
        })?;
        let glossary = match parsed {
            GlossaryFile::Entries(entries) => {
                Glossary::new(entries, Vec::new(), GlossaryOptions::default())
            }
            GlossaryFile::Full {
                entries,
                synonyms,
                options,
            } => Glossary::new(entries, synonyms, options),
        };
        Ok(glossary)
    }

    /// Whether the glossary carries no entries and no synonyms
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.synonyms.is_empty()
    }
}

/// Digest of the glossary content, independent of entry order in the file.
///
/// Entries and synonym groups are sorted before hashing so two files with
/// the same content in a different order share cache entries.
fn stable_hash(
    entries: &[GlossaryEntry],
    synonyms: &[SynonymGroup],
    options: &GlossaryOptions,
) -> String {
    let mut sorted_entries: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    sorted_entries.sort_unstable();

    let mut sorted_synonyms: Vec<(String, Vec<String>)> = synonyms
        .iter()
        .map(|g| {
            let mut variants = g.variants.clone();
            variants.sort_unstable();
            (g.canonical.clone(), variants)
        })
        .collect();
    sorted_synonyms.sort_unstable();

    let canonical: Value = json!({
        "entries": sorted_entries
            .iter()
            .map(|(s, t)| json!([s, t]))
            .collect::<Vec<Value>>(),
        "synonyms": sorted_synonyms
            .iter()
            .map(|(c, v)| json!([c, v]))
            .collect::<Vec<Value>>(),
        "options": {
            "caseInsensitive": options.case_insensitive,
            "wordBoundary": options.word_boundary,
        },
    });
    sha256_hex(&canonical.to_string())
}

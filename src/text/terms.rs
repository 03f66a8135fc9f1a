/*!
 * Glossary term placeholders.
 *
 * Before translation, glossary source terms are replaced with neutral
 * placeholders (`{{T0001}}`), so the model cannot paraphrase pinned
 * terminology. After translation the placeholders are substituted with
 * the exact target terms, then synonym variants are rewritten to their
 * canonical forms.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::glossary::Glossary;

/// Guard against placeholder collisions with user text
static PLACEHOLDER_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{T\d{4}\}\}").unwrap());

/// A minted placeholder and the target term it stands for
pub type PlaceholderMap = Vec<(String, String)>;

fn placeholder(index: usize) -> String {
    format!("{{{{T{:04}}}}}", index)
}

/// Terms with only ASCII alphanumeric content get word-boundary matching;
/// anything else (CJK, punctuation-bearing terms) matches as a substring.
fn use_word_boundary(term: &str) -> bool {
    term.chars().any(|c| c.is_alphanumeric()) && term.is_ascii()
}

/// Replace glossary source terms with placeholders.
///
/// Longer terms are applied first so a term embedded in a longer one
/// ("API" in "API gateway") never splits its host. Every occurrence of a
/// matched term is replaced by the same placeholder. Returns the rewritten
/// text and the placeholder-to-target mapping for restoration.
pub fn apply_term_placeholders(text: &str, glossary: &Glossary) -> (String, PlaceholderMap) {
    let mut out = text.to_string();
    let mut map: PlaceholderMap = Vec::new();

    if glossary.entries.is_empty() {
        return (out, map);
    }

    // Stable sort keeps file order for equal-length terms
    let mut entries: Vec<_> = glossary.entries.iter().collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.source.chars().count()));

    let mut index = 0usize;
    for entry in entries {
        index += 1;
        let ph = placeholder(index);

        let replaced = if glossary.options.case_insensitive || glossary.options.word_boundary {
            let mut pattern = String::new();
            if glossary.options.case_insensitive {
                pattern.push_str("(?i)");
            }
            let escaped = regex::escape(&entry.source);
            if glossary.options.word_boundary && use_word_boundary(&entry.source) {
                pattern.push_str(&format!(r"\b{}\b", escaped));
            } else {
                pattern.push_str(&escaped);
            }
            // Escaped literal pattern, cannot fail to compile
            let re = Regex::new(&pattern).unwrap();
            if re.is_match(&out) {
                out = re.replace_all(&out, ph.as_str()).into_owned();
                true
            } else {
                false
            }
        } else if out.contains(&entry.source) {
            out = out.replace(&entry.source, &ph);
            true
        } else {
            false
        };

        if replaced {
            map.push((ph, entry.target.clone()));
        }
    }

    (out, map)
}

/// Substitute placeholders with their pinned target terms
pub fn restore_placeholders(text: &str, map: &PlaceholderMap) -> String {
    let mut out = text.to_string();
    for (ph, target) in map {
        out = out.replace(ph, target);
    }
    out
}

/// Rewrite known wording variants to their canonical forms
pub fn apply_synonym_fixes(text: &str, glossary: &Glossary) -> String {
    let mut out = text.to_string();
    for group in &glossary.synonyms {
        for variant in &group.variants {
            if variant.is_empty() || variant == &group.canonical {
                continue;
            }
            out = out.replace(variant, &group.canonical);
        }
    }
    out
}

/// Whether the text still carries an unconsumed placeholder shape
pub fn has_stray_placeholder(text: &str) -> bool {
    PLACEHOLDER_SHAPE.is_match(text)
}

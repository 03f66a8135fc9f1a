/*!
 * Markup protection tokens.
 *
 * Spans that must never be translated are swapped for opaque tokens
 * before the provider call and swapped back afterwards. Fenced code
 * blocks, pre and code HTML blocks, inline code and link URLs each get
 * their own token family so a mangled response is easy to diagnose.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fenced Markdown code blocks, including the fences
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```").unwrap());

/// HTML pre blocks, tags included
static PRE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<pre[\s\S]*?</pre>").unwrap());

/// HTML code blocks, tags included
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<code[\s\S]*?</code>").unwrap());

/// Inline backtick spans on a single line
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").unwrap());

/// The URL part of a Markdown link, `](...)`
static LINK_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\(([^)]+)\)").unwrap());

/// Mapping from protection token to the original span it replaced.
///
/// Tokens are unique within one protection pass; restoration replaces
/// them in insertion order.
#[derive(Debug, Default, Clone)]
pub struct TokenMap {
    entries: Vec<(String, String)>,
    counter: usize,
}

impl TokenMap {
    /// Number of protected spans
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was protected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mint the next token of a family and remember the original span
    fn store(&mut self, family: &str, original: &str) -> String {
        self.counter += 1;
        let token = format!("[[{}_{:04}]]", family, self.counter);
        self.entries.push((token.clone(), original.to_string()));
        token
    }
}

/// Replace all protectable spans with opaque tokens.
///
/// Families are applied from largest construct to smallest, so inline
/// code inside an already-tokenized fenced block is never double
/// protected. Returns the tokenized text and the map needed to undo it.
pub fn protect_markup(text: &str) -> (String, TokenMap) {
    let mut map = TokenMap::default();
    let mut out = text.to_string();

    for (regex, family) in [
        (&*FENCED_BLOCK, "CODEBLOCK"),
        (&*PRE_BLOCK, "HTMLBLOCK"),
        (&*CODE_BLOCK, "HTMLBLOCK"),
        (&*INLINE_CODE, "INLINE"),
    ] {
        out = regex
            .replace_all(&out, |caps: &Captures| map.store(family, &caps[0]))
            .into_owned();
    }

    // Only the URL inside the parentheses is swapped; link text stays
    // translatable.
    out = LINK_URL
        .replace_all(&out, |caps: &Captures| {
            format!("]({})", map.store("URL", &caps[1]))
        })
        .into_owned();

    (out, map)
}

/// Put every protected span back in place of its token
pub fn restore_markup(text: &str, map: &TokenMap) -> String {
    let mut out = text.to_string();
    for (token, original) in &map.entries {
        out = out.replace(token, original);
    }
    out
}

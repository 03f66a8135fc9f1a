/*!
 * Paragraph splitting and size-bounded chunking.
 *
 * Segmentation is lossless: the input is cut into content segments and
 * separator segments (the blank-line runs between paragraphs), and the
 * concatenation of all segments reproduces the input byte for byte.
 * Separators are carried through untouched; only content segments are
 * ever translated. All size budgets count characters, not bytes.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// A blank-line run between paragraphs
static PARAGRAPH_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Sentence-terminal punctuation (Latin and CJK) with trailing spacing,
/// or a lone newline; used to find split points inside long paragraphs
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?\u{3002}\u{FF01}\u{FF1F}]+[\s\u{3000}]*|\n").unwrap());

/// One piece of a segmented document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Verbatim slice of the input
    pub text: String,
    /// Whether this piece is a between-paragraph separator
    pub is_separator: bool,
}

impl Segment {
    /// A translatable content segment
    pub fn content<S: Into<String>>(text: S) -> Self {
        Segment {
            text: text.into(),
            is_separator: false,
        }
    }

    /// A verbatim separator segment
    pub fn separator<S: Into<String>>(text: S) -> Self {
        Segment {
            text: text.into(),
            is_separator: true,
        }
    }
}

/// Split text into alternating content and separator segments.
///
/// Every blank-line run becomes its own separator segment holding the
/// exact original bytes. Empty input yields no segments.
pub fn split_paragraphs(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0usize;

    for sep in PARAGRAPH_SEPARATOR.find_iter(text) {
        if sep.start() > last {
            segments.push(Segment::content(&text[last..sep.start()]));
        }
        segments.push(Segment::separator(sep.as_str()));
        last = sep.end();
    }
    if last < text.len() {
        segments.push(Segment::content(&text[last..]));
    }

    segments
}

/// Merge consecutive short content segments up to `min_chars`.
///
/// Runs of small paragraphs turn into single chunks so the provider sees
/// enough context; the separators between merged paragraphs are folded
/// into the merged content verbatim, so losslessness is preserved. Two
/// content segments merge while either side is still under `min_chars`
/// and the combined content fits the `max_chars` budget.
pub fn merge_short_segments(segments: Vec<Segment>, min_chars: usize, max_chars: usize) -> Vec<Segment> {
    if min_chars == 0 {
        return segments;
    }
    let mut merged: Vec<Segment> = Vec::new();
    let mut buffer = String::new();

    let flush = |buffer: &mut String, merged: &mut Vec<Segment>| {
        if !buffer.is_empty() {
            merged.push(Segment::content(std::mem::take(buffer)));
        }
    };

    for segment in segments {
        if segment.is_separator {
            // A separator sticks to the open buffer so later short
            // paragraphs can still join it
            if buffer.is_empty() {
                merged.push(segment);
            } else {
                buffer.push_str(&segment.text);
            }
            continue;
        }

        let segment_len = segment.text.chars().count();
        let buffer_len = buffer.chars().count();

        if buffer.is_empty() {
            if segment_len < min_chars {
                buffer = segment.text;
            } else {
                merged.push(segment);
            }
            continue;
        }

        if buffer_len + segment_len <= max_chars
            && (segment_len < min_chars || buffer_len < min_chars)
        {
            buffer.push_str(&segment.text);
        } else {
            flush(&mut buffer, &mut merged);
            if segment_len < min_chars {
                buffer = segment.text;
            } else {
                merged.push(segment);
            }
        }
    }
    flush(&mut buffer, &mut merged);

    merged
}

/// Split one over-long text at sentence boundaries, then hard-split any
/// piece that still exceeds the budget.
///
/// The concatenation of the returned chunks always equals the input.
pub fn split_long_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    // Alternating sentence bodies and their terminators, all verbatim
    let mut parts: Vec<&str> = Vec::new();
    let mut last = 0usize;
    for m in SENTENCE_BREAK.find_iter(text) {
        if m.start() > last {
            parts.push(&text[last..m.start()]);
        }
        parts.push(m.as_str());
        last = m.end();
    }
    if last < text.len() {
        parts.push(&text[last..]);
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut buffer = String::new();
    for part in parts {
        let part_len = part.chars().count();
        if buffer.chars().count() + part_len <= max_chars {
            buffer.push_str(part);
            continue;
        }
        if !buffer.is_empty() {
            chunks.push(std::mem::take(&mut buffer));
        }
        if part_len <= max_chars {
            buffer = part.to_string();
        } else {
            // No usable boundary; cut at the character budget
            let mut iter = part.chars();
            loop {
                let piece: String = iter.by_ref().take(max_chars).collect();
                if piece.is_empty() {
                    break;
                }
                chunks.push(piece);
            }
        }
    }
    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

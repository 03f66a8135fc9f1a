/*!
 * Text protection and segmentation.
 *
 * Everything that happens to text before and after the provider call:
 * shielding markup behind opaque tokens, substituting glossary terms
 * with placeholders, and splitting text into size-bounded chunks that
 * reassemble losslessly.
 */

pub mod protect;
pub mod segment;
pub mod terms;

pub use protect::{protect_markup, restore_markup, TokenMap};
pub use segment::{merge_short_segments, split_long_text, split_paragraphs, Segment};
pub use terms::{apply_synonym_fixes, apply_term_placeholders, restore_placeholders};

//! Grapheme-cluster helpers for char-offset addressing.

use unicode_segmentation::UnicodeSegmentation;

/// Snap a char offset down to the nearest grapheme-cluster boundary.
///
/// Offsets past the end snap to the text length. Callers snap cursor offsets
/// through this before addressing the document; the document itself rejects
/// non-boundary offsets rather than guessing, so an edit never lands inside
/// a cluster (e.g. between an emoji and its modifier).
pub fn snap_to_grapheme(text: &str, char_offset: usize) -> usize {
    let mut boundary = 0;
    let mut chars_seen = 0;
    for grapheme in text.graphemes(true) {
        if chars_seen >= char_offset {
            break;
        }
        chars_seen += grapheme.chars().count();
        if chars_seen <= char_offset {
            boundary = chars_seen;
        }
    }
    boundary
}

/// Whether `char_offset` lies on a grapheme-cluster boundary of `text`.
pub fn is_grapheme_boundary(text: &str, char_offset: usize) -> bool {
    snap_to_grapheme(text, char_offset) == char_offset
}

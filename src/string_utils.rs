//! UTF-8 safe offset helpers
//!
//! Selections arrive as byte offsets that may come from another tool (a
//! browser textarea counts UTF-16 units, a terminal counts columns). Every
//! offset is snapped onto a character boundary before it is used to slice.
//!
//! # Example
//! ```ignore
//! use quire::string_utils::clamp_selection;
//!
//! let text = "Hei på deg"; // 'å' is 2 bytes
//! let (start, end) = clamp_selection(text, 99, 6);
//! assert_eq!(&text[start..end], "å deg");
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Largest index `<= index` on a character boundary, capped at `s.len()`.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

// ─────────────────────────────────────────────────────────────────────────────
// Selections
// ─────────────────────────────────────────────────────────────────────────────

/// Order a selection, cap it at the text length and snap both ends down
/// onto char boundaries.
pub fn clamp_selection(s: &str, start: usize, end: usize) -> (usize, usize) {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    (floor_char_boundary(s, start), floor_char_boundary(s, end))
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Byte span of the full lines touched by `start..end`.
///
/// The span starts after the newline preceding `start` and ends at the
/// newline following `end` (exclusive), or at the end of the text.
pub fn line_span(s: &str, start: usize, end: usize) -> (usize, usize) {
    let (start, end) = clamp_selection(s, start, end);
    let line_start = s[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = s[end..].find('\n').map(|i| end + i).unwrap_or(s.len());
    (line_start, line_end)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

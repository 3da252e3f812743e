//! Source-mode text operations
//!
//! Formatting in source mode edits the markdown text directly. Every
//! operation takes the full text plus a byte selection and returns a
//! [`FormatResult`] with the new text and the selection to restore.
//!
//! # Example
//! ```ignore
//! use quire::editor::source::wrap_selection;
//!
//! let result = wrap_selection("say hello", (4, 9), "**", "**");
//! assert_eq!(result.text, "say **hello**");
//! assert_eq!(result.selection, Some((6, 11)));
//! ```

use super::format::FormatSpan;
use crate::markdown::is_unsafe_url;
use crate::string_utils::{clamp_selection, line_span};

/// Spaces added by one indent step.
pub const INDENT: &str = "  ";

// ─────────────────────────────────────────────────────────────────────────────
// Format Result
// ─────────────────────────────────────────────────────────────────────────────

/// Result of applying a source-mode operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    /// The new text after formatting
    pub text: String,
    /// New cursor position (byte offset)
    pub cursor: usize,
    /// New selection range (start, end) if applicable
    pub selection: Option<(usize, usize)>,
    /// Whether the formatting was applied (vs removed/toggled off)
    pub applied: bool,
}

impl FormatResult {
    /// Create a result with just cursor position.
    pub fn with_cursor(text: String, cursor: usize) -> Self {
        Self {
            text,
            cursor,
            selection: None,
            applied: true,
        }
    }

    /// Create a result with a selection range.
    pub fn with_selection(text: String, start: usize, end: usize) -> Self {
        Self {
            text,
            cursor: end,
            selection: Some((start, end)),
            applied: true,
        }
    }

    /// Mark that formatting was removed rather than applied.
    pub fn toggled_off(mut self) -> Self {
        self.applied = false;
        self
    }

    /// Mark that formatting was not applied (e.g., no selection).
    pub fn not_applied(mut self) -> Self {
        self.applied = false;
        self
    }

    /// Selection to restore, falling back to a caret at the cursor.
    pub fn selection_or_cursor(&self) -> (usize, usize) {
        self.selection.unwrap_or((self.cursor, self.cursor))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a formatting span to the selection.
///
/// Inline spans toggle; list spans add a prefix to every selected line.
/// Links to unsafe URLs are refused and leave the text untouched.
pub fn apply_format(text: &str, selection: (usize, usize), span: &FormatSpan) -> FormatResult {
    match span {
        FormatSpan::Link(url) if url.trim().is_empty() || is_unsafe_url(url) => {
            FormatResult::with_selection(text.to_string(), selection.0, selection.1).not_applied()
        }
        FormatSpan::OrderedListItem => apply_list_prefix(text, selection, true),
        FormatSpan::UnorderedListItem => apply_list_prefix(text, selection, false),
        _ => match span.source_wrapper() {
            Some((before, after)) => wrap_selection(text, selection, &before, &after),
            None => FormatResult::with_cursor(text.to_string(), selection.1).not_applied(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Wrapping
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a marker is made of emphasis stars, where `*` and `**` share
/// characters and have to be told apart by run length.
fn is_star_marker(marker: &str) -> bool {
    !marker.is_empty() && marker.bytes().all(|b| b == b'*')
}

fn leading_stars(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b'*').count()
}

fn trailing_stars(s: &str) -> usize {
    s.bytes().rev().take_while(|&b| b == b'*').count()
}

/// Decide whether star runs of the given lengths carry this marker.
///
/// A run of three is bold plus italic, so italic needs an odd run and bold
/// needs at least two stars on each side.
fn star_runs_match(marker: &str, left: usize, right: usize) -> bool {
    if marker.len() == 1 {
        left % 2 == 1 && right % 2 == 1
    } else {
        left >= marker.len() && right >= marker.len()
    }
}

/// Wrap the selection in `before`/`after`, or remove them if present.
///
/// Removal happens when the selection itself starts and ends with the
/// markers, or when the markers directly surround it. Applying and then
/// removing restores the text byte-for-byte. An empty selection is left
/// alone.
pub fn wrap_selection(
    text: &str,
    selection: (usize, usize),
    before: &str,
    after: &str,
) -> FormatResult {
    let (start, end) = clamp_selection(text, selection.0, selection.1);
    let selected = &text[start..end];
    let stars = is_star_marker(before) && before == after;

    if start == end {
        // User must select text first
        return FormatResult::with_cursor(text.to_string(), start).not_applied();
    }

    // Selection includes the markers
    let markers_inside = selected.len() > before.len() + after.len()
        && selected.starts_with(before)
        && selected.ends_with(after)
        && (!stars
            || (leading_stars(selected) + trailing_stars(selected) < selected.len()
                && star_runs_match(before, leading_stars(selected), trailing_stars(selected))));
    if markers_inside {
        let inner = &selected[before.len()..selected.len() - after.len()];
        let new_text = format!("{}{}{}", &text[..start], inner, &text[end..]);
        return FormatResult::with_selection(new_text, start, start + inner.len()).toggled_off();
    }

    // Markers surround the selection
    let markers_outside = start >= before.len()
        && text[..start].ends_with(before)
        && text[end..].starts_with(after)
        && (!stars || star_runs_match(before, trailing_stars(&text[..start]), leading_stars(&text[end..])));
    if markers_outside {
        let open = start - before.len();
        let new_text = format!(
            "{}{}{}",
            &text[..open],
            selected,
            &text[end + after.len()..]
        );
        return FormatResult::with_selection(new_text, open, open + selected.len()).toggled_off();
    }

    let new_text = format!(
        "{}{}{}{}{}",
        &text[..start],
        before,
        selected,
        after,
        &text[end..]
    );
    let inner_start = start + before.len();
    FormatResult::with_selection(new_text, inner_start, inner_start + selected.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Indent or outdent every line touched by the selection.
///
/// Indent prepends two spaces to each line. Outdent removes up to two
/// leading spaces. The selection start moves by the first line's change and
/// the end by the total change, neither moving before the first line.
pub fn adjust_indentation(text: &str, selection: (usize, usize), outdent: bool) -> FormatResult {
    let (start, end) = clamp_selection(text, selection.0, selection.1);
    let (line_start, line_end) = line_span(text, start, end);

    let mut start_delta: isize = 0;
    let mut end_delta: isize = 0;
    let lines: Vec<String> = text[line_start..line_end]
        .split('\n')
        .enumerate()
        .map(|(index, line)| {
            let delta = if outdent {
                -(line.bytes().take(INDENT.len()).take_while(|&b| b == b' ').count() as isize)
            } else {
                INDENT.len() as isize
            };
            if index == 0 {
                start_delta += delta;
            }
            end_delta += delta;
            if outdent {
                line[delta.unsigned_abs()..].to_string()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect();

    let new_text = format!(
        "{}{}{}",
        &text[..line_start],
        lines.join("\n"),
        &text[line_end..]
    );
    let shift = |offset: usize, delta: isize| offset.saturating_add_signed(delta).max(line_start);
    let result = FormatResult::with_selection(new_text, shift(start, start_delta), shift(end, end_delta));
    if end_delta == 0 {
        result.not_applied()
    } else {
        result
    }
}

/// Prefix every non-blank line in the selection with a list marker.
///
/// Prefixes are always added, never toggled: applying twice nests the
/// marker. The result selects the rewritten lines.
pub fn apply_list_prefix(text: &str, selection: (usize, usize), ordered: bool) -> FormatResult {
    let (start, end) = clamp_selection(text, selection.0, selection.1);
    let (line_start, line_end) = line_span(text, start, end);

    let mut number = 0;
    let lines: Vec<String> = text[line_start..line_end]
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                return line.to_string();
            }
            number += 1;
            if ordered {
                format!("{}. {}", number, line)
            } else {
                format!("- {}", line)
            }
        })
        .collect();
    let block = lines.join("\n");

    // A blank line still becomes a list item to type into
    let block = if number == 0 {
        if ordered {
            format!("1. {}", block)
        } else {
            format!("- {}", block)
        }
    } else {
        block
    };

    let new_text = format!("{}{}{}", &text[..line_start], block, &text[line_end..]);
    FormatResult::with_selection(new_text, line_start, line_start + block.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Inline wrapping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bold_wraps_and_reselects_inner_text() {
        let result = wrap_selection("say hello", (4, 9), "**", "**");
        assert_eq!(result.text, "say **hello**");
        assert_eq!(result.selection, Some((6, 11)));
        assert!(result.applied);
    }

    #[test]
    fn test_bold_toggle_restores_exact_text() {
        let original = "say hello there";
        let applied = wrap_selection(original, (4, 9), "**", "**");
        let removed = wrap_selection(&applied.text, applied.selection.unwrap(), "**", "**");
        assert_eq!(removed.text, original);
        assert_eq!(removed.selection, Some((4, 9)));
        assert!(!removed.applied);
    }

    #[test]
    fn test_toggle_with_markers_selected() {
        let result = wrap_selection("a **b** c", (2, 7), "**", "**");
        assert_eq!(result.text, "a b c");
        assert_eq!(result.selection, Some((2, 3)));
    }

    #[test]
    fn test_underline_toggle() {
        let original = "plain words";
        let applied = wrap_selection(original, (0, 5), "<u>", "</u>");
        assert_eq!(applied.text, "<u>plain</u> words");
        let removed = wrap_selection(&applied.text, applied.selection.unwrap(), "<u>", "</u>");
        assert_eq!(removed.text, original);
    }

    #[test]
    fn test_italic_inside_bold_is_added_not_stripped() {
        let result = wrap_selection("**x**", (2, 3), "*", "*");
        assert_eq!(result.text, "***x***");
        assert_eq!(result.selection, Some((3, 4)));

        let removed = wrap_selection(&result.text, (3, 4), "*", "*");
        assert_eq!(removed.text, "**x**");
    }

    #[test]
    fn test_bold_removed_from_bold_italic() {
        let result = wrap_selection("***x***", (3, 4), "**", "**");
        assert_eq!(result.text, "*x*");
        assert!(!result.applied);
    }

    #[test]
    fn test_empty_selection_is_refused() {
        let result = wrap_selection("hello", (2, 2), "**", "**");
        assert_eq!(result.text, "hello");
        assert!(!result.applied);
    }

    #[test]
    fn test_caret_between_empty_markers_is_refused() {
        let result = wrap_selection("a****b", (3, 3), "**", "**");
        assert_eq!(result.text, "a****b");
        assert!(!result.applied);
    }

    #[test]
    fn test_offsets_clamped_to_char_boundaries() {
        // 'å' is 2 bytes starting at 1
        let result = wrap_selection("på deg", (2, 99), "*", "*");
        assert_eq!(result.text, "p*å deg*");
    }

    #[test]
    fn test_apply_format_dispatch() {
        let result = apply_format("word", (0, 4), &FormatSpan::Strikethrough);
        assert_eq!(result.text, "~~word~~");
        let result = apply_format("word", (0, 4), &FormatSpan::Link("http://x.com".into()));
        assert_eq!(
            result.text,
            r#"[word](http://x.com){:target="_blank" rel="noopener noreferrer"}"#
        );
    }

    #[test]
    fn test_unsafe_link_leaves_text_alone() {
        let result = apply_format("click", (0, 5), &FormatSpan::Link("javascript:alert(1)".into()));
        assert_eq!(result.text, "click");
        assert_eq!(result.selection, Some((0, 5)));
        assert!(!result.applied);

        let result = apply_format("click", (0, 5), &FormatSpan::Link(" JaVa\tscript:x".into()));
        assert_eq!(result.text, "click");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Indentation
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_indent_multiple_lines() {
        let text = "one\ntwo\nthree";
        let result = adjust_indentation(text, (1, 10), false);
        assert_eq!(result.text, "  one\n  two\n  three");
        // Three lines: end grows by six
        assert_eq!(result.selection, Some((3, 16)));
    }

    #[test]
    fn test_indent_caret_on_current_line() {
        let result = adjust_indentation("a\nb\nc", (2, 2), false);
        assert_eq!(result.text, "a\n  b\nc");
        assert_eq!(result.selection, Some((4, 4)));
    }

    #[test]
    fn test_outdent_single_space_removes_one() {
        let result = adjust_indentation(" item", (3, 3), true);
        assert_eq!(result.text, "item");
        assert_eq!(result.selection, Some((2, 2)));
    }

    #[test]
    fn test_outdent_removes_at_most_two() {
        let result = adjust_indentation("    deep\nflat", (0, 13), true);
        assert_eq!(result.text, "  deep\nflat");
        assert_eq!(result.selection, Some((0, 11)));
    }

    #[test]
    fn test_outdent_clamps_to_line_start() {
        let result = adjust_indentation("x\n  y", (3, 3), true);
        assert_eq!(result.text, "x\ny");
        assert_eq!(result.selection, Some((2, 2)));
    }

    #[test]
    fn test_outdent_without_spaces_is_not_applied() {
        let result = adjust_indentation("flat", (0, 0), true);
        assert_eq!(result.text, "flat");
        assert!(!result.applied);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lists
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_unordered_prefix_per_line() {
        let result = apply_list_prefix("a\nb", (0, 3), false);
        assert_eq!(result.text, "- a\n- b");
        assert_eq!(result.selection, Some((0, 7)));
    }

    #[test]
    fn test_ordered_prefix_skips_blank_lines() {
        let result = apply_list_prefix("a\n\nb", (0, 4), true);
        assert_eq!(result.text, "1. a\n\n2. b");
    }

    #[test]
    fn test_list_prefix_stacks() {
        let once = apply_list_prefix("a", (0, 1), false);
        let twice = apply_list_prefix(&once.text, once.selection.unwrap(), false);
        assert_eq!(twice.text, "- - a");
    }

    #[test]
    fn test_list_prefix_on_empty_line() {
        let result = apply_list_prefix("", (0, 0), true);
        assert_eq!(result.text, "1. ");
    }
}

//! Visual-mode tree operations
//!
//! Formatting in the visual surface is explicit tree surgery over the
//! [`Dom`]: adding a span extracts the selected content and wraps it in a
//! new element, removing one promotes the selected text out of every
//! matching ancestor. Structural failures are logged and turned into
//! no-ops; every function returns the selection to restore, or `None` when
//! the tree was left alone.

use log::debug;

use super::format::{FormatSpan, CLEAR_FORMAT_TAGS};
use super::markers::with_selection_markers;
use crate::dom::{expand_to_word, Boundary, Dom, DomRange, NodeId, RangeError};
use crate::markdown::{is_unsafe_url, sanitize_dom};

/// Elements treated as blocks when grouping a selection.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "ul", "ol",
    "table", "td", "th", "hr", "dl", "dd", "dt", "figure", "figcaption", "section", "article",
];

/// Elements whose children can be regrouped into lists or quotes.
const HOST_TAGS: &[&str] = &["blockquote", "li", "td", "th", "div"];

/// Attributes a dialog-created link carries besides `href`.
pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a formatting span to the selection.
///
/// Inline spans toggle: if the selection sits inside a matching element the
/// formatting is removed, otherwise it is added. Lists always wrap.
pub fn apply_format(dom: &mut Dom, range: &DomRange, span: &FormatSpan) -> Option<DomRange> {
    let result = if span.is_list() {
        wrap_list(dom, range, *span == FormatSpan::OrderedListItem)
    } else {
        toggle_inline(dom, range, span)
    };
    skip_on_error(span.label(), result)
}

/// Remove links, bold, italic and underline from the selection.
pub fn clear_formatting(dom: &mut Dom, range: &DomRange) -> Option<DomRange> {
    let result = word_range(dom, range).and_then(|range| match range {
        Some(range) => remove_tags(dom, &range, CLEAR_FORMAT_TAGS),
        None => Ok(None),
    });
    skip_on_error("Clear formatting", result)
}

/// Wrap the selected blocks in a blockquote, or unwrap the nearest one.
pub fn adjust_indentation(dom: &mut Dom, range: &DomRange, outdent: bool) -> Option<DomRange> {
    let result = if outdent {
        outdent_blocks(dom, range)
    } else {
        indent_blocks(dom, range)
    };
    skip_on_error(if outdent { "Outdent" } else { "Indent" }, result)
}

fn skip_on_error(action: &str, result: Result<Option<DomRange>, RangeError>) -> Option<DomRange> {
    match result {
        Ok(range) => range,
        Err(err) => {
            debug!("{} skipped: {}", action, err);
            None
        }
    }
}

/// Normalize a selection and expand a caret to its word.
fn word_range(dom: &Dom, range: &DomRange) -> Result<Option<DomRange>, RangeError> {
    let range = dom.normalize_range(range)?;
    let expanded = expand_to_word(dom, &range);
    if expanded.is_none() {
        debug!("No word at the caret; nothing to format");
    }
    Ok(expanded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline formatting
// ─────────────────────────────────────────────────────────────────────────────

fn toggle_inline(
    dom: &mut Dom,
    range: &DomRange,
    span: &FormatSpan,
) -> Result<Option<DomRange>, RangeError> {
    let Some(range) = word_range(dom, range)? else {
        return Ok(None);
    };
    if is_formatted(dom, &range, span.tag_set()) {
        remove_tags(dom, &range, span.tag_set())
    } else {
        add_inline(dom, &range, span)
    }
}

/// Whether the whole selection already carries one of `tags`.
///
/// True when the selection sits inside a matching element, or when every
/// visible piece of selected text has a matching ancestor of its own (a
/// selection spanning several formatted blocks).
fn is_formatted(dom: &Dom, range: &DomRange, tags: &[&str]) -> bool {
    if dom.closest(dom.common_container(range), tags).is_some() {
        return true;
    }
    let visible: Vec<NodeId> = dom
        .text_slices(range)
        .into_iter()
        .filter(|&(node, from, to)| dom.text(node).is_some_and(|t| !t[from..to].trim().is_empty()))
        .map(|(node, _, _)| node)
        .collect();
    !visible.is_empty() && visible.iter().all(|&node| dom.closest(node, tags).is_some())
}

/// Wrap the selection in the span's element, one wrapper per block.
fn add_inline(
    dom: &mut Dom,
    range: &DomRange,
    span: &FormatSpan,
) -> Result<Option<DomRange>, RangeError> {
    if let FormatSpan::Link(url) = span {
        if url.trim().is_empty() || is_unsafe_url(url) {
            debug!("Refused to link to an unsafe or empty URL");
            return Ok(None);
        }
    }

    let groups = block_groups(dom, range);
    for group in &groups {
        dom.check_extractable(group)?;
    }

    let mut bounds: Vec<(Boundary, Boundary)> = Vec::new();
    for group in groups {
        if dom.closest(dom.common_container(&group), span.tag_set()).is_some() {
            // Block already formatted here
            bounds.push((group.start, group.end));
            continue;
        }
        let wrapper = dom.create_element(span.tag());
        if let FormatSpan::Link(url) = span {
            dom.set_attr(wrapper, "href", url);
        }
        dom.surround_range(&group, wrapper)?;

        // Never stacked: drop the same formatting nested inside
        for inner in dom.descendants(wrapper) {
            if dom.has_tag(inner, span.tag_set()) {
                dom.unwrap_node(inner);
            }
        }
        sanitize_dom(dom, wrapper);
        bounds.push((Boundary::new(wrapper, 0), Boundary::new(wrapper, dom.child_count(wrapper))));
    }

    let (Some(&(start, _)), Some(&(_, end))) = (bounds.first(), bounds.last()) else {
        return Ok(None);
    };
    Ok(Some(DomRange::new(start, end)))
}

/// Split a selection into one range per block it touches.
///
/// A selection inside a single block is returned as is. Across blocks, the
/// covered text of each block becomes its own range and whitespace-only
/// pieces between blocks are dropped. Selections spanning table cells stay
/// whole, so the structure check rejects them.
fn block_groups(dom: &Dom, range: &DomRange) -> Vec<DomRange> {
    struct Group {
        block: NodeId,
        start: Boundary,
        end: Boundary,
        visible: bool,
    }

    let mut groups: Vec<Group> = Vec::new();
    for (node, from, to) in dom.text_slices(range) {
        let block = dom.closest(node, BLOCK_TAGS).unwrap_or_else(|| dom.root());
        let visible = dom.text(node).is_some_and(|t| !t[from..to].trim().is_empty());
        match groups.last_mut() {
            Some(group) if group.block == block => {
                group.end = Boundary::new(node, to);
                group.visible |= visible;
            }
            _ => groups.push(Group {
                block,
                start: Boundary::new(node, from),
                end: Boundary::new(node, to),
                visible,
            }),
        }
    }

    // Table cells are never formatted piecewise
    let in_cells = groups.iter().any(|group| dom.has_tag(group.block, &["td", "th"]));
    let whole = match groups.as_slice() {
        [] => true,
        [only] => dom.contains(only.block, dom.common_container(range)),
        _ => in_cells,
    };
    if whole {
        return vec![*range];
    }
    groups
        .into_iter()
        .filter(|group| group.visible)
        .map(|group| DomRange::new(group.start, group.end))
        .collect()
}

/// Promote the selected text out of every ancestor in `tags`.
fn remove_tags(
    dom: &mut Dom,
    range: &DomRange,
    tags: &[&str],
) -> Result<Option<DomRange>, RangeError> {
    let (removed, restored) = with_selection_markers(dom, range, |markers| {
        let mut removed = 0;
        for text in markers.text_nodes_between() {
            while let Some(ancestor) = markers.closest(text, tags) {
                markers.split_out(text, ancestor)?;
                removed += 1;
            }
        }
        Ok(removed)
    })?;
    debug!("Removed {} formatting element(s)", removed);
    Ok(restored)
}

// ─────────────────────────────────────────────────────────────────────────────
// Block operations
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap the selected blocks in a list, one item per block. Runs of inline
/// content share an item; paragraphs are unwrapped into their item.
fn wrap_list(dom: &mut Dom, range: &DomRange, ordered: bool) -> Result<Option<DomRange>, RangeError> {
    let range = dom.normalize_range(range)?;
    let Some((host, blocks)) = selected_blocks(dom, &range) else {
        return Ok(None);
    };
    let index = dom.index_in_parent(blocks[0]).unwrap_or(0);

    let list = dom.create_element(if ordered { "ol" } else { "ul" });
    let mut inline_item: Option<NodeId> = None;
    for block in blocks {
        if dom.has_tag(block, &["p"]) {
            let item = dom.create_element("li");
            for child in dom.children(block).to_vec() {
                dom.append_child(item, child);
            }
            dom.detach(block);
            dom.append_child(list, item);
            inline_item = None;
        } else if dom.has_tag(block, BLOCK_TAGS) {
            let item = dom.create_element("li");
            dom.append_child(item, block);
            dom.append_child(list, item);
            inline_item = None;
        } else {
            let item = match inline_item {
                Some(item) => item,
                None => {
                    let item = dom.create_element("li");
                    dom.append_child(list, item);
                    inline_item = Some(item);
                    item
                }
            };
            dom.append_child(item, block);
        }
    }
    dom.insert_child(host, index, list);
    Ok(Some(dom.select_contents(list)))
}

fn indent_blocks(dom: &mut Dom, range: &DomRange) -> Result<Option<DomRange>, RangeError> {
    let range = dom.normalize_range(range)?;
    let Some((host, blocks)) = selected_blocks(dom, &range) else {
        return Ok(None);
    };
    let index = dom.index_in_parent(blocks[0]).unwrap_or(0);

    let quote = dom.create_element("blockquote");
    for block in blocks {
        dom.append_child(quote, block);
    }
    dom.insert_child(host, index, quote);

    if range.start.node == host || range.end.node == host {
        Ok(Some(dom.select_contents(quote)))
    } else {
        Ok(Some(range))
    }
}

fn outdent_blocks(dom: &mut Dom, range: &DomRange) -> Result<Option<DomRange>, RangeError> {
    let range = dom.normalize_range(range)?;
    let common = dom
        .common_ancestor(range.start.node, range.end.node)
        .ok_or(RangeError::Detached)?;
    let Some(quote) = dom.closest(common, &["blockquote"]) else {
        debug!("Outdent outside a blockquote; nothing to do");
        return Ok(None);
    };
    let parent = dom.parent(quote).ok_or(RangeError::Detached)?;
    let index = dom.index_in_parent(quote).unwrap_or(0);
    let count = dom.child_count(quote);
    dom.unwrap_node(quote);

    if range.start.node == quote || range.end.node == quote {
        Ok(Some(DomRange::new(
            Boundary::new(parent, index),
            Boundary::new(parent, index + count),
        )))
    } else {
        Ok(Some(range))
    }
}

/// The children of the nearest host element covered by the selection,
/// skipping whitespace-only text between blocks.
fn selected_blocks(dom: &Dom, range: &DomRange) -> Option<(NodeId, Vec<NodeId>)> {
    let common = dom.common_ancestor(range.start.node, range.end.node)?;
    let host = std::iter::once(common)
        .chain(dom.ancestors(common))
        .find(|&node| node == dom.root() || dom.has_tag(node, HOST_TAGS))?;

    let first = host_child(dom, host, range.start, false)?;
    let last = host_child(dom, host, range.end, true)?;
    let children = dom.children(host);
    let a = children.iter().position(|&c| c == first)?;
    let b = children.iter().position(|&c| c == last)?;

    let blocks: Vec<NodeId> = children[a.min(b)..=a.max(b)]
        .iter()
        .copied()
        .filter(|&node| !dom.text(node).is_some_and(|t| t.trim().is_empty()))
        .collect();
    if blocks.is_empty() {
        None
    } else {
        Some((host, blocks))
    }
}

/// The child of `host` holding a boundary.
fn host_child(dom: &Dom, host: NodeId, at: Boundary, is_end: bool) -> Option<NodeId> {
    if at.node == host {
        let children = dom.children(host);
        let index = if is_end && at.offset > 0 {
            at.offset - 1
        } else {
            at.offset
        };
        return children.get(index.min(children.len().checked_sub(1)?)).copied();
    }
    std::iter::once(at.node)
        .chain(dom.ancestors(at.node))
        .find(|&node| dom.parent(node) == Some(host))
}

// ─────────────────────────────────────────────────────────────────────────────
// Links
// ─────────────────────────────────────────────────────────────────────────────

/// Point an existing anchor at a new URL, keeping the node.
///
/// The text is replaced only when it differs from the current content.
pub fn update_anchor(dom: &mut Dom, anchor: NodeId, url: &str, text: &str) {
    dom.set_attr(anchor, "href", url);
    dom.set_attr(anchor, "target", LINK_TARGET);
    dom.set_attr(anchor, "rel", LINK_REL);
    if !text.is_empty() && dom.text_content(anchor) != text {
        dom.clear_children(anchor);
        let node = dom.create_text(text);
        dom.append_child(anchor, node);
    }
    sanitize_dom(dom, anchor);
}

/// Insert a new anchor for the selection and return a caret just after it.
///
/// When `text` matches the selected text the selection is wrapped, keeping
/// any formatting inside it; otherwise the selection is replaced by `text`.
pub fn insert_anchor(
    dom: &mut Dom,
    range: &DomRange,
    url: &str,
    text: &str,
) -> Result<DomRange, RangeError> {
    let range = dom.check_extractable(range)?;
    let anchor = dom.create_element("a");
    dom.set_attr(anchor, "href", url);
    dom.set_attr(anchor, "target", LINK_TARGET);
    dom.set_attr(anchor, "rel", LINK_REL);

    if !range.is_collapsed() && dom.range_text(&range) == text {
        dom.surround_range(&range, anchor)?;
    } else {
        let at = dom.delete_range(&range)?;
        let label = dom.create_text(text);
        dom.append_child(anchor, label);
        dom.insert_at(at, anchor);
    }
    sanitize_dom(dom, anchor);
    debug!("Inserted link to {}", url);

    let parent = dom.parent(anchor).ok_or(RangeError::Detached)?;
    let index = dom.index_in_parent(anchor).ok_or(RangeError::Detached)?;
    Ok(DomRange::collapsed(Boundary::new(parent, index + 1)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn find_text(dom: &Dom, needle: &str) -> NodeId {
        dom.descendants(dom.root())
            .into_iter()
            .find(|&n| dom.text(n).is_some_and(|t| t.contains(needle)))
            .unwrap()
    }

    /// Range over `needle` inside the text node containing it.
    fn select(dom: &Dom, needle: &str) -> DomRange {
        let node = find_text(dom, needle);
        let start = dom.text(node).unwrap().find(needle).unwrap();
        DomRange::new(
            Boundary::new(node, start),
            Boundary::new(node, start + needle.len()),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inline toggles
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bold_wraps_selection() {
        let mut dom = Dom::parse("<p>say hello there</p>");
        let range = select(&dom, "hello");
        let selection = apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p>say <strong>hello</strong> there</p>");
        assert_eq!(dom.range_text(&selection), "hello");
    }

    #[test]
    fn test_bold_toggle_restores_text() {
        let mut dom = Dom::parse("<p>say hello there</p>");
        let range = select(&dom, "hello");
        let selection = apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        let selection = apply_format(&mut dom, &selection, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p>say hello there</p>");
        assert_eq!(dom.text_content(dom.root()), "say hello there");
        assert_eq!(dom.range_text(&selection), "hello");
    }

    #[test]
    fn test_toggle_recognizes_b_tag() {
        let mut dom = Dom::parse("<p><b>heavy</b> text</p>");
        let range = select(&dom, "heavy");
        apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p>heavy text</p>");
    }

    #[test]
    fn test_caret_expands_to_word() {
        let mut dom = Dom::parse("<p>one two three</p>");
        let node = find_text(&dom, "two");
        let caret = DomRange::collapsed(Boundary::new(node, 5));
        apply_format(&mut dom, &caret, &FormatSpan::Italic).unwrap();
        assert_eq!(dom.html(), "<p>one <em>two</em> three</p>");
    }

    #[test]
    fn test_caret_between_spaces_is_noop() {
        let mut dom = Dom::parse("<p>a  b</p>");
        let node = find_text(&dom, "a");
        let caret = DomRange::collapsed(Boundary::new(node, 2));
        assert_eq!(apply_format(&mut dom, &caret, &FormatSpan::Bold), None);
        assert_eq!(dom.html(), "<p>a  b</p>");
    }

    #[test]
    fn test_partial_removal_keeps_rest_formatted() {
        let mut dom = Dom::parse("<p><strong>bold text</strong></p>");
        let range = select(&dom, "text");
        apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p><strong>bold </strong>text</p>");
    }

    #[test]
    fn test_addition_across_paragraphs_wraps_each_block() {
        let mut dom = Dom::parse("<p>first</p>\n<p>second</p>");
        let start = find_text(&dom, "first");
        let end = find_text(&dom, "second");
        let range = DomRange::new(Boundary::new(start, 2), Boundary::new(end, 3));
        let selection = apply_format(&mut dom, &range, &FormatSpan::Strikethrough).unwrap();
        assert_eq!(dom.html(), "<p>fi<s>rst</s></p>\n<p><s>sec</s>ond</p>");
        assert_eq!(dom.range_text(&selection), "rst\nsec");
    }

    #[test]
    fn test_toggle_across_paragraphs_removes_wrappers() {
        let mut dom = Dom::parse("<p>first</p><p>second</p>");
        let start = find_text(&dom, "first");
        let end = find_text(&dom, "second");
        let range = DomRange::new(Boundary::new(start, 0), Boundary::new(end, 6));

        let selection = apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p><strong>first</strong></p><p><strong>second</strong></p>");

        let selection = apply_format(&mut dom, &selection, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p>first</p><p>second</p>");
        assert_eq!(dom.range_text(&selection), "firstsecond");
    }

    #[test]
    fn test_addition_across_paragraphs_skips_formatted_block() {
        let mut dom = Dom::parse("<p><strong>first</strong></p><p>second</p>");
        let start = find_text(&dom, "first");
        let end = find_text(&dom, "second");
        let range = DomRange::new(Boundary::new(start, 0), Boundary::new(end, 6));

        apply_format(&mut dom, &range, &FormatSpan::Bold).unwrap();
        assert_eq!(dom.html(), "<p><strong>first</strong></p><p><strong>second</strong></p>");
    }

    #[test]
    fn test_nested_same_format_is_merged() {
        let mut dom = Dom::parse("<p>a <em>b</em> c</p>");
        let start = find_text(&dom, "a ");
        let end = find_text(&dom, " c");
        let range = DomRange::new(Boundary::new(start, 0), Boundary::new(end, 2));
        apply_format(&mut dom, &range, &FormatSpan::Italic).unwrap();
        assert_eq!(dom.html(), "<p><em>a b c</em></p>");
    }

    #[test]
    fn test_table_structure_is_rejected_untouched() {
        let html = "<table><tr><td>a</td><td>b</td></tr></table>";
        let mut dom = Dom::parse(html);
        let start = find_text(&dom, "a");
        let end = find_text(&dom, "b");
        let range = DomRange::new(Boundary::new(start, 0), Boundary::new(end, 1));
        let before = dom.html();
        assert_eq!(apply_format(&mut dom, &range, &FormatSpan::Bold), None);
        assert_eq!(dom.html(), before);
    }

    #[test]
    fn test_unsafe_link_span_is_refused() {
        let mut dom = Dom::parse("<p>click</p>");
        let range = select(&dom, "click");
        let span = FormatSpan::Link("javascript:alert(1)".to_string());
        assert_eq!(apply_format(&mut dom, &range, &span), None);
        assert_eq!(dom.html(), "<p>click</p>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clear formatting
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_clear_formatting_nested() {
        let mut dom = Dom::parse("<p><strong><em>text</em></strong></p>");
        let range = select(&dom, "text");
        let selection = clear_formatting(&mut dom, &range).unwrap();
        assert_eq!(dom.html(), "<p>text</p>");
        assert_eq!(dom.range_text(&selection), "text");
    }

    #[test]
    fn test_clear_formatting_leaves_outside_text() {
        let mut dom = Dom::parse("<p><strong><em>text</em></strong> and <u>kept</u></p>");
        let range = select(&dom, "text");
        clear_formatting(&mut dom, &range).unwrap();
        assert_eq!(dom.html(), "<p>text and <u>kept</u></p>");
    }

    #[test]
    fn test_clear_formatting_removes_links() {
        let mut dom = Dom::parse(r#"<p><a href="http://x.com"><b>go</b></a></p>"#);
        let range = select(&dom, "go");
        clear_formatting(&mut dom, &range).unwrap();
        assert_eq!(dom.html(), "<p>go</p>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lists and indentation
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_list_wraps_paragraphs() {
        let mut dom = Dom::parse("<p>one</p><p>two</p>");
        let start = find_text(&dom, "one");
        let end = find_text(&dom, "two");
        let range = DomRange::new(Boundary::new(start, 0), Boundary::new(end, 3));
        apply_format(&mut dom, &range, &FormatSpan::OrderedListItem).unwrap();
        assert_eq!(dom.html(), "<ol><li>one</li><li>two</li></ol>");
    }

    #[test]
    fn test_list_wrapping_stacks() {
        let mut dom = Dom::parse("<p>item</p>");
        let range = select(&dom, "item");
        apply_format(&mut dom, &range, &FormatSpan::UnorderedListItem).unwrap();
        let range = select(&dom, "item");
        apply_format(&mut dom, &range, &FormatSpan::UnorderedListItem).unwrap();
        assert_eq!(dom.html(), "<ul><li><ul><li>item</li></ul></li></ul>");
    }

    #[test]
    fn test_indent_then_outdent() {
        let mut dom = Dom::parse("<p>a</p><p>b</p>");
        let range = select(&dom, "b");
        let selection = adjust_indentation(&mut dom, &range, false).unwrap();
        assert_eq!(dom.html(), "<p>a</p><blockquote><p>b</p></blockquote>");
        adjust_indentation(&mut dom, &selection, true).unwrap();
        assert_eq!(dom.html(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_outdent_without_quote_is_noop() {
        let mut dom = Dom::parse("<p>a</p>");
        let range = select(&dom, "a");
        assert_eq!(adjust_indentation(&mut dom, &range, true), None);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_anchor_wraps_matching_selection() {
        let mut dom = Dom::parse("<p>see <em>docs</em> now</p>");
        let range = select(&dom, "docs");
        let caret = insert_anchor(&mut dom, &range, "http://x.com", "docs").unwrap();
        assert_eq!(
            dom.html(),
            r#"<p>see <em><a href="http://x.com" target="_blank" rel="noopener noreferrer">docs</a></em> now</p>"#
        );
        assert!(caret.is_collapsed());
    }

    #[test]
    fn test_insert_anchor_replaces_with_new_text() {
        let mut dom = Dom::parse("<p>see docs now</p>");
        let range = select(&dom, "docs");
        insert_anchor(&mut dom, &range, "http://x.com", "the docs").unwrap();
        assert_eq!(
            dom.html(),
            r#"<p>see <a href="http://x.com" target="_blank" rel="noopener noreferrer">the docs</a> now</p>"#
        );
    }

    #[test]
    fn test_update_anchor_keeps_node() {
        let mut dom = Dom::parse(r#"<p><a href="http://old.com">old</a></p>"#);
        let anchor = dom.closest(find_text(&dom, "old"), &["a"]).unwrap();
        update_anchor(&mut dom, anchor, "http://new.com", "new");
        assert_eq!(dom.attr(anchor, "href"), Some("http://new.com"));
        assert_eq!(dom.text_content(anchor), "new");
        assert!(dom.is_attached(anchor));
    }
}

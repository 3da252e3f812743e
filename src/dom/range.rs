//! Ranges over the document tree
//!
//! A [`Boundary`] is a `(node, offset)` pair: a byte offset inside a text
//! node, or a child index inside an element. Extraction and splitting work
//! by cutting the tree along both boundaries up to their common container,
//! cloning every partially covered element on the way, the same way a
//! browser's `Range.extractContents` behaves.

use std::cmp::Ordering;
use std::fmt;

use super::{Dom, NodeId};
use crate::string_utils::floor_char_boundary;

/// Elements that must never be cut in two.
const STRUCTURAL_TAGS: &[&str] = &[
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "colgroup",
];

/// Containers whose children may not be wrapped in arbitrary elements.
const CHILD_RESTRICTED_TAGS: &[&str] = &["table", "thead", "tbody", "tfoot", "tr", "colgroup", "ul", "ol"];

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// A position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection over the tree. `start` is expected to precede `end`;
/// operations that mutate the tree normalize the order first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A caret at a single position.
    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Structural failure of a range operation. The tree is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A boundary node is not part of the document
    Detached,
    /// A boundary offset lies past the end of its node
    OffsetOutOfBounds { offset: usize, len: usize },
    /// The range would split or re-parent table or list structure
    CrossesStructure(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Detached => write!(f, "range boundary is not attached to the document"),
            RangeError::OffsetOutOfBounds { offset, len } => {
                write!(f, "range offset {} is past the node length {}", offset, len)
            }
            RangeError::CrossesStructure(tag) => {
                write!(f, "range would split <{}> structure", tag)
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// Nodes removed from the tree by [`Dom::extract_range`], in document order,
/// together with the position they were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub parent: NodeId,
    pub index: usize,
    pub nodes: Vec<NodeId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Range operations
// ─────────────────────────────────────────────────────────────────────────────

impl Dom {
    /// Range covering all contents of a node.
    pub fn select_contents(&self, node: NodeId) -> DomRange {
        DomRange::new(
            Boundary::new(node, 0),
            Boundary::new(node, self.node_len(node)),
        )
    }

    /// Document-order comparison of two boundaries.
    pub fn compare_boundaries(&self, a: Boundary, b: Boundary) -> Ordering {
        self.boundary_key(a).cmp(&self.boundary_key(b))
    }

    fn boundary_key(&self, b: Boundary) -> Vec<usize> {
        let mut key = self.path(b.node);
        key.push(b.offset);
        key
    }

    fn validate_boundary(&self, b: Boundary) -> Result<Boundary, RangeError> {
        if b.node.0 >= self.nodes.len() || !self.is_attached(b.node) {
            return Err(RangeError::Detached);
        }
        let len = self.node_len(b.node);
        if b.offset > len {
            return Err(RangeError::OffsetOutOfBounds {
                offset: b.offset,
                len,
            });
        }
        let offset = match self.text(b.node) {
            Some(text) => floor_char_boundary(text, b.offset),
            None => b.offset,
        };
        Ok(Boundary::new(b.node, offset))
    }

    /// Validate both boundaries, snap text offsets to char boundaries and
    /// put the range in document order.
    pub fn normalize_range(&self, range: &DomRange) -> Result<DomRange, RangeError> {
        let start = self.validate_boundary(range.start)?;
        let end = self.validate_boundary(range.end)?;
        if self.compare_boundaries(start, end) == Ordering::Greater {
            Ok(DomRange::new(end, start))
        } else {
            Ok(DomRange::new(start, end))
        }
    }

    /// Deepest element (or the root) containing both boundaries.
    pub fn common_container(&self, range: &DomRange) -> NodeId {
        let ancestor = self
            .common_ancestor(range.start.node, range.end.node)
            .unwrap_or_else(|| self.root());
        if self.is_text(ancestor) {
            self.parent(ancestor).unwrap_or_else(|| self.root())
        } else {
            ancestor
        }
    }

    /// Text fragments covered by a range as `(node, start, end)` byte spans.
    pub fn text_slices(&self, range: &DomRange) -> Vec<(NodeId, usize, usize)> {
        let mut out = Vec::new();
        let mut inside = false;
        self.collect_slices(self.root(), range, &mut inside, &mut out);
        out
    }

    fn collect_slices(
        &self,
        node: NodeId,
        range: &DomRange,
        inside: &mut bool,
        out: &mut Vec<(NodeId, usize, usize)>,
    ) -> bool {
        if let Some(text) = self.text(node) {
            let mut from = 0;
            if range.start.node == node {
                *inside = true;
                from = range.start.offset.min(text.len());
            }
            let done = range.end.node == node;
            let to = if done {
                range.end.offset.min(text.len())
            } else {
                text.len()
            };
            let (from, to) = (floor_char_boundary(text, from), floor_char_boundary(text, to));
            if *inside && from < to {
                out.push((node, from, to));
            }
            return done;
        }

        let children = self.children(node);
        for index in 0..=children.len() {
            if range.start.node == node && range.start.offset == index {
                *inside = true;
            }
            if range.end.node == node && range.end.offset == index {
                return true;
            }
            if let Some(&child) = children.get(index) {
                if self.collect_slices(child, range, inside, out) {
                    return true;
                }
            }
        }
        false
    }

    /// Plain text covered by a range.
    pub fn range_text(&self, range: &DomRange) -> String {
        self.text_slices(range)
            .into_iter()
            .filter_map(|(node, from, to)| self.text(node).map(|text| text[from..to].to_string()))
            .collect()
    }

    /// Insert a detached node at a boundary, splitting a text node if needed.
    pub fn insert_at(&mut self, at: Boundary, node: NodeId) {
        if let Some(text) = self.text(at.node) {
            let len = text.len();
            if at.offset == 0 {
                self.insert_before(at.node, node);
            } else if at.offset >= len {
                self.insert_after(at.node, node);
            } else {
                self.split_text(at.node, at.offset);
                self.insert_after(at.node, node);
            }
        } else {
            self.insert_child(at.node, at.offset, node);
        }
    }

    /// Refuse to cut through table cells or rows between `from` and `stop`.
    fn check_splittable(&self, from: NodeId, stop: NodeId) -> Result<(), RangeError> {
        for node in std::iter::once(from).chain(self.ancestors(from)) {
            if node == stop {
                break;
            }
            if let Some(tag) = self.tag(node) {
                if STRUCTURAL_TAGS.contains(&tag) {
                    return Err(RangeError::CrossesStructure(tag.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Split the tree along `point` up to `stop` and return the child index
    /// of `stop` that the point now corresponds to. Nothing is cloned when
    /// the point sits at an edge, so no empty fragments are produced.
    fn split_to(&mut self, point: Boundary, stop: NodeId) -> usize {
        let mut container = point.node;
        let mut offset = point.offset;

        if self.is_text(container) {
            let (Some(parent), Some(index)) = (self.parent(container), self.index_in_parent(container))
            else {
                return 0;
            };
            let len = self.node_len(container);
            if offset == 0 {
                offset = index;
            } else if offset >= len {
                offset = index + 1;
            } else {
                self.split_text(container, offset);
                offset = index + 1;
            }
            container = parent;
        }

        while container != stop {
            let (Some(parent), Some(index)) = (self.parent(container), self.index_in_parent(container))
            else {
                break;
            };
            if offset == 0 {
                offset = index;
            } else if offset >= self.child_count(container) {
                offset = index + 1;
            } else {
                let clone = self.shallow_clone(container);
                let tail = self.children(container)[offset..].to_vec();
                for child in tail {
                    self.append_child(clone, child);
                }
                self.insert_child(parent, index + 1, clone);
                offset = index + 1;
            }
            container = parent;
        }
        offset
    }

    /// Check that [`Dom::extract_range`] would succeed, without mutating.
    /// Returns the normalized range.
    pub fn check_extractable(&self, range: &DomRange) -> Result<DomRange, RangeError> {
        let range = self.normalize_range(range)?;
        let stop = self.common_container(&range);

        if let Some(tag) = self.tag(stop) {
            if CHILD_RESTRICTED_TAGS.contains(&tag) && !range.is_collapsed() {
                return Err(RangeError::CrossesStructure(tag.to_string()));
            }
        }
        self.check_splittable(range.start.node, stop)?;
        self.check_splittable(range.end.node, stop)?;
        Ok(range)
    }

    /// Cut the range out of the tree.
    ///
    /// Partially covered elements are split; the covered pieces are detached
    /// and returned. Fails without touching the tree if the cut would break
    /// table or list structure.
    pub fn extract_range(&mut self, range: &DomRange) -> Result<Extracted, RangeError> {
        let range = self.check_extractable(range)?;
        let stop = self.common_container(&range);

        // End first: splitting there never moves the start boundary
        let end_index = self.split_to(range.end, stop);
        let trailing = self.child_count(stop).saturating_sub(end_index);
        let start_index = self.split_to(range.start, stop);
        let end_index = self.child_count(stop).saturating_sub(trailing).max(start_index);

        let nodes = self.children(stop)[start_index..end_index].to_vec();
        for &node in &nodes {
            self.detach(node);
        }
        Ok(Extracted {
            parent: stop,
            index: start_index,
            nodes,
        })
    }

    /// Wrap the range contents in `wrapper` (a detached element).
    pub fn surround_range(&mut self, range: &DomRange, wrapper: NodeId) -> Result<(), RangeError> {
        let extracted = self.extract_range(range)?;
        self.insert_child(extracted.parent, extracted.index, wrapper);
        for node in extracted.nodes {
            self.append_child(wrapper, node);
        }
        Ok(())
    }

    /// Remove the range contents and return the collapsed insertion point.
    pub fn delete_range(&mut self, range: &DomRange) -> Result<Boundary, RangeError> {
        let extracted = self.extract_range(range)?;
        Ok(Boundary::new(extracted.parent, extracted.index))
    }

    /// Promote `node` out of its ancestor element `ancestor`.
    ///
    /// The ancestor is split into the part before the node's branch, the
    /// branch itself and the part after it; the branch's copy of the
    /// ancestor is then unwrapped. Elements between the node and the
    /// ancestor are cloned along, so other formatting on the branch stays.
    pub fn split_out(&mut self, node: NodeId, ancestor: NodeId) -> Result<(), RangeError> {
        let parent = self.parent(ancestor).ok_or(RangeError::Detached)?;
        let container = self.parent(node).ok_or(RangeError::Detached)?;
        let index = self.index_in_parent(node).ok_or(RangeError::Detached)?;
        if !self.contains(ancestor, node) {
            return Err(RangeError::Detached);
        }
        self.check_splittable(container, ancestor)?;

        let tag = self.tag(ancestor).unwrap_or_default().to_string();

        let end_index = self.split_to(Boundary::new(container, index + 1), parent);
        let trailing = self.child_count(parent).saturating_sub(end_index);
        let start_index = self.split_to(Boundary::new(container, index), parent);
        let end_index = self.child_count(parent).saturating_sub(trailing).max(start_index);

        let pieces = self.children(parent)[start_index..end_index].to_vec();
        for piece in pieces {
            if self.tag(piece) == Some(tag.as_str()) {
                self.unwrap_node(piece);
            }
        }
        Ok(())
    }
}

/// Expand a caret to the whitespace-delimited word around it.
///
/// Returns `None` when the caret is not in text or sits between whitespace.
/// A non-collapsed range is returned unchanged.
pub fn expand_to_word(dom: &Dom, range: &DomRange) -> Option<DomRange> {
    if !range.is_collapsed() {
        return Some(*range);
    }

    let caret = resolve_text_caret(dom, range.start)?;
    let text = dom.text(caret.node)?;
    let offset = floor_char_boundary(text, caret.offset);

    let start = text[..offset]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| offset + i)
        .unwrap_or(text.len());

    if start >= end {
        return None;
    }
    Some(DomRange::new(
        Boundary::new(caret.node, start),
        Boundary::new(caret.node, end),
    ))
}

/// Map an element caret onto an adjacent text node.
fn resolve_text_caret(dom: &Dom, at: Boundary) -> Option<Boundary> {
    if dom.is_text(at.node) {
        return Some(at);
    }
    let children = dom.children(at.node);
    if let Some(&before) = at.offset.checked_sub(1).and_then(|i| children.get(i)) {
        if let Some(text) = dom.text(before) {
            return Some(Boundary::new(before, text.len()));
        }
    }
    match children.get(at.offset) {
        Some(&after) if dom.is_text(after) => Some(Boundary::new(after, 0)),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

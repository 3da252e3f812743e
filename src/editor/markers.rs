//! Selection markers
//!
//! Tree surgery moves, clones and unwraps the nodes a selection points
//! into, so a `DomRange` taken before the surgery is meaningless after it.
//! [`SelectionMarkers`] brackets the selection with two empty marker
//! elements instead; the markers travel with the content and the selection
//! is read back from wherever they ended up.
//!
//! The markers are owned by the guard. Dropping it (including while
//! unwinding) removes them from the tree, so they never leak into the
//! document.

use std::ops::{Deref, DerefMut};

use log::debug;

use crate::dom::{Boundary, Dom, DomRange, NodeId, RangeError};

/// Attribute identifying marker elements.
pub const MARKER_ATTR: &str = "data-quire-marker";

/// Inline elements a marker may be lifted out of when it sits at their edge.
const LIFTABLE_TAGS: &[&str] = &[
    "a", "b", "strong", "i", "em", "u", "s", "strike", "del", "span", "code", "mark", "small",
    "sub", "sup",
];

/// Scoped pair of selection markers inserted into a [`Dom`].
pub struct SelectionMarkers<'a> {
    dom: &'a mut Dom,
    start: NodeId,
    end: NodeId,
}

impl<'a> SelectionMarkers<'a> {
    /// Bracket a range with markers.
    ///
    /// The end marker goes in first so that splitting a shared text node
    /// leaves the start offset valid. Markers sitting at the edge of inline
    /// formatting are lifted out of it; this does not change the covered
    /// content but keeps later splits from leaving empty formatting shells.
    pub fn insert(dom: &'a mut Dom, range: &DomRange) -> Result<Self, RangeError> {
        let range = dom.normalize_range(range)?;

        let end = dom.create_element("span");
        dom.set_attr(end, MARKER_ATTR, "end");
        dom.insert_at(range.end, end);

        let start = dom.create_element("span");
        dom.set_attr(start, MARKER_ATTR, "start");
        dom.insert_at(range.start, start);

        lift_marker(dom, start);
        lift_marker(dom, end);

        Ok(Self { dom, start, end })
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Text nodes lying between the two markers, in document order.
    pub fn text_nodes_between(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut inside = false;
        for node in self.dom.descendants(self.dom.root()) {
            if node == self.start {
                inside = true;
            } else if node == self.end {
                break;
            } else if inside && self.dom.is_text(node) {
                out.push(node);
            }
        }
        out
    }

    /// Read the selection back from the markers and remove them.
    ///
    /// Returns `None` when a marker is no longer attached; the markers are
    /// removed either way.
    pub fn release(self) -> Option<DomRange> {
        let dom = &mut *self.dom;
        if !dom.is_attached(self.start) || !dom.is_attached(self.end) {
            debug!("Selection marker lost during edit; selection not restored");
            return None;
        }
        let start = marker_position(dom, self.start)?;
        dom.detach(self.start);
        let end = marker_position(dom, self.end)?;
        dom.detach(self.end);
        Some(DomRange::new(start, end))
    }
}

impl Deref for SelectionMarkers<'_> {
    type Target = Dom;

    fn deref(&self) -> &Dom {
        self.dom
    }
}

impl DerefMut for SelectionMarkers<'_> {
    fn deref_mut(&mut self) -> &mut Dom {
        self.dom
    }
}

impl Drop for SelectionMarkers<'_> {
    fn drop(&mut self) {
        self.dom.detach(self.start);
        self.dom.detach(self.end);
    }
}

/// Run `edit` with the range bracketed by markers.
///
/// On success returns the callback's value and the restored selection. If
/// the callback fails, the markers are removed before its error is
/// returned.
pub fn with_selection_markers<T, F>(
    dom: &mut Dom,
    range: &DomRange,
    edit: F,
) -> Result<(T, Option<DomRange>), RangeError>
where
    F: FnOnce(&mut SelectionMarkers<'_>) -> Result<T, RangeError>,
{
    let mut markers = SelectionMarkers::insert(dom, range)?;
    let value = edit(&mut markers)?;
    let restored = markers.release();
    Ok((value, restored))
}

fn marker_position(dom: &Dom, marker: NodeId) -> Option<Boundary> {
    let parent = dom.parent(marker)?;
    let index = dom.index_in_parent(marker)?;
    Some(Boundary::new(parent, index))
}

/// Move a marker out of inline elements while it is their first or last
/// child.
fn lift_marker(dom: &mut Dom, marker: NodeId) {
    while let Some(parent) = dom.parent(marker) {
        if !dom.has_tag(parent, LIFTABLE_TAGS) {
            break;
        }
        let Some(index) = dom.index_in_parent(marker) else {
            break;
        };
        if index == 0 {
            dom.insert_before(parent, marker);
        } else if index + 1 == dom.child_count(parent) {
            dom.insert_after(parent, marker);
        } else {
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

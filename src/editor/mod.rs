//! Editor module for Quire
//!
//! This module contains the dual-mode document buffer and the operations
//! that edit it: toggling inline formatting, list and indentation
//! commands, and the link dialog. Source-mode operations work on markdown
//! text, visual-mode operations on the sanitized document tree.

mod buffer;
mod format;
mod link;
mod markers;
pub mod source;
pub mod visual;

pub use buffer::{DocumentBuffer, EMPTY_SURFACE_HTML};
pub use format::{FormatSpan, CLEAR_FORMAT_TAGS, LINK_ATTRIBUTES};
pub use link::{
    find_markdown_link, markdown_link, validate_url, ExistingLink, LinkContext, LinkDialog,
    LinkError, MarkdownLink,
};
pub use markers::{with_selection_markers, SelectionMarkers, MARKER_ATTR};
pub use source::FormatResult;

use crate::dom::DomRange;

/// A selection in the active representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Byte offsets into the markdown source
    Source { start: usize, end: usize },
    /// Range in the visual tree
    Visual(DomRange),
}

impl Selection {
    pub fn is_collapsed(&self) -> bool {
        match self {
            Selection::Source { start, end } => start == end,
            Selection::Visual(range) => range.is_collapsed(),
        }
    }
}

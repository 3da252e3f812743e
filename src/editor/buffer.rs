//! Dual-mode document buffer
//!
//! The buffer holds the post body twice: as markdown source and as a
//! sanitized visual tree. Only the representation of the active mode is
//! kept current while editing; the other one is re-derived when the mode
//! is toggled. A revision counter tracks edits, so toggling without any
//! edit reuses the cached representation instead of converting again.

use log::debug;

use super::format::FormatSpan;
use super::{source, visual, Selection};
use crate::config::EditorMode;
use crate::dom::{Boundary, Dom, DomRange};
use crate::markdown::{dom_to_markdown, markdown_to_dom, sanitize_dom};

/// Markup installed in an empty visual surface so it keeps a caret.
pub const EMPTY_SURFACE_HTML: &str = "<p><br></p>";

/// The document being edited, in both representations.
#[derive(Debug, Clone)]
pub struct DocumentBuffer {
    /// Markdown source
    source: String,
    /// Sanitized visual tree
    visual: Dom,
    /// Which representation is authoritative
    mode: EditorMode,
    /// Byte selection in the source
    source_selection: (usize, usize),
    /// Selection in the visual tree (None = caret at the end)
    visual_selection: Option<DomRange>,
    /// Unsaved user edits exist
    dirty: bool,
    /// Programmatic changes in progress; edits don't mark dirty
    suppress_dirty: bool,
    /// Incremented on every edit
    revision: u64,
    /// Revision at which both representations last agreed
    synced_revision: u64,
}

impl Default for DocumentBuffer {
    fn default() -> Self {
        Self::new(EditorMode::default())
    }
}

impl DocumentBuffer {
    /// Create an empty buffer in the given mode.
    pub fn new(mode: EditorMode) -> Self {
        let mut buffer = Self {
            source: String::new(),
            visual: Dom::new(),
            mode,
            source_selection: (0, 0),
            visual_selection: None,
            dirty: false,
            suppress_dirty: false,
            revision: 0,
            synced_revision: 0,
        };
        buffer.ensure_caret_target();
        buffer
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Markdown source as last synchronized or edited.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The visual tree.
    pub fn visual(&self) -> &Dom {
        &self.visual
    }

    /// Edit counter, bumped by every user edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the document with `markdown` without marking it dirty.
    ///
    /// Both representations are derived at once, so they start in sync.
    pub fn set_content(&mut self, markdown: &str) {
        self.with_suppressed_dirty(|buffer| {
            buffer.source = markdown.to_string();
            buffer.visual = render_visual(markdown);
            buffer.reset_selections();
            buffer.ensure_caret_target();
            buffer.record_edit();
            buffer.synced_revision = buffer.revision;
        });
    }

    /// The document as markdown.
    ///
    /// In visual mode the tree is serialized; an empty surface yields an
    /// empty string.
    pub fn content(&self) -> String {
        match self.mode {
            EditorMode::Source => self.source.clone(),
            EditorMode::Visual => dom_to_markdown(&self.visual),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mode switching
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch between visual and source mode. Returns the new mode.
    pub fn toggle_mode(&mut self) -> EditorMode {
        let target = self.mode.toggle();
        self.with_suppressed_dirty(|buffer| {
            if buffer.revision == buffer.synced_revision {
                debug!("No edits since last sync; reusing {} view", target.label());
            } else {
                match target {
                    EditorMode::Visual => buffer.visual = render_visual(&buffer.source),
                    EditorMode::Source => buffer.source = dom_to_markdown(&buffer.visual),
                }
                buffer.synced_revision = buffer.revision;
            }
            buffer.mode = target;
            buffer.reset_selections();
            buffer.ensure_caret_target();
        });
        target
    }

    /// Switch to `mode` if not already there.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.mode != mode {
            self.toggle_mode();
        }
    }

    fn reset_selections(&mut self) {
        self.source_selection = (0, 0);
        self.visual_selection = None;
    }

    /// Give an empty visual surface a paragraph to put the caret in.
    fn ensure_caret_target(&mut self) {
        if self.mode == EditorMode::Visual && self.visual.is_visibly_empty(self.visual.root()) {
            self.visual = Dom::parse(EMPTY_SURFACE_HTML);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn source_selection(&self) -> (usize, usize) {
        self.source_selection
    }

    pub fn set_source_selection(&mut self, start: usize, end: usize) {
        self.source_selection = crate::string_utils::clamp_selection(&self.source, start, end);
    }

    pub fn visual_selection(&self) -> Option<DomRange> {
        self.visual_selection
    }

    pub fn set_visual_selection(&mut self, range: Option<DomRange>) {
        self.visual_selection = range;
    }

    /// The current selection of the active mode.
    pub fn selection(&self) -> Selection {
        match self.mode {
            EditorMode::Source => Selection::Source {
                start: self.source_selection.0,
                end: self.source_selection.1,
            },
            EditorMode::Visual => Selection::Visual(self.visual_range()),
        }
    }

    /// Visual selection, or a caret at the end of the last text.
    pub fn visual_range(&self) -> DomRange {
        self.visual_selection
            .filter(|range| self.visual.normalize_range(range).is_ok())
            .unwrap_or_else(|| default_caret(&self.visual))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the source text, as typed by the user.
    pub fn replace_source(&mut self, text: String) {
        if text != self.source {
            self.source = text;
            let (start, end) = self.source_selection;
            self.set_source_selection(start, end);
            self.record_edit();
        }
    }

    /// Mutable access to the visual tree. Counts as an edit.
    pub fn visual_mut(&mut self) -> &mut Dom {
        self.record_edit();
        &mut self.visual
    }

    /// Run a tree operation that returns the selection to restore, or
    /// `None` if it left the tree alone. Returns whether anything changed.
    pub fn apply_visual<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut Dom, &DomRange) -> Option<DomRange>,
    {
        let range = self.visual_range();
        match edit(&mut self.visual, &range) {
            Some(selection) => {
                self.visual_selection = Some(selection);
                self.record_edit();
                true
            }
            None => false,
        }
    }

    /// Apply a source-mode result. Returns whether the text changed.
    pub fn apply_source(&mut self, result: source::FormatResult) -> bool {
        let (start, end) = result.selection_or_cursor();
        let changed = result.text != self.source;
        if changed {
            self.source = result.text;
            self.record_edit();
        }
        self.set_source_selection(start, end);
        changed
    }

    /// Apply (or toggle off) a formatting span at the current selection.
    pub fn apply_format(&mut self, span: &FormatSpan) -> bool {
        match self.mode {
            EditorMode::Source => {
                let result = source::apply_format(&self.source, self.source_selection, span);
                self.apply_source(result)
            }
            EditorMode::Visual => {
                self.apply_visual(|dom, range| visual::apply_format(dom, range, span))
            }
        }
    }

    /// Indent (or outdent) the current selection.
    pub fn adjust_indentation(&mut self, outdent: bool) -> bool {
        match self.mode {
            EditorMode::Source => {
                let result = source::adjust_indentation(&self.source, self.source_selection, outdent);
                self.apply_source(result)
            }
            EditorMode::Visual => {
                self.apply_visual(|dom, range| visual::adjust_indentation(dom, range, outdent))
            }
        }
    }

    /// Remove inline formatting from the selection (visual mode only).
    pub fn clear_formatting(&mut self) -> bool {
        match self.mode {
            EditorMode::Source => {
                debug!("Clear formatting is only available in visual mode");
                false
            }
            EditorMode::Visual => self.apply_visual(visual::clear_formatting),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dirty tracking
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `f` with dirty tracking suspended.
    pub fn with_suppressed_dirty<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        let previous = self.suppress_dirty;
        self.suppress_dirty = true;
        let value = f(self);
        self.suppress_dirty = previous;
        value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark unsaved changes unless tracking is suppressed.
    pub fn mark_dirty(&mut self) {
        if !self.suppress_dirty {
            self.dirty = true;
        }
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    fn record_edit(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.mark_dirty();
    }
}

/// Render markdown into a sanitized tree.
fn render_visual(markdown: &str) -> Dom {
    let mut dom = markdown_to_dom(markdown);
    let root = dom.root();
    sanitize_dom(&mut dom, root);
    dom
}

/// Caret after the last visible text, else at the start of the first
/// block.
fn default_caret(dom: &Dom) -> DomRange {
    let root = dom.root();
    let last_text = dom
        .descendants(root)
        .into_iter()
        .rev()
        .find(|&node| dom.text(node).is_some_and(|t| !t.trim().is_empty()));
    if let Some(node) = last_text {
        return DomRange::collapsed(Boundary::new(node, dom.node_len(node)));
    }
    match dom.children(root).iter().find(|&&child| dom.is_element(child)) {
        Some(&block) => DomRange::collapsed(Boundary::new(block, 0)),
        None => DomRange::collapsed(Boundary::new(root, dom.child_count(root))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

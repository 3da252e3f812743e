//! Link dialog
//!
//! Opening the dialog captures a [`LinkContext`] from the buffer: the
//! selection, any link already under it and the text to prefill. Submitting
//! validates the URL and writes the link into the active representation;
//! cancelling drops the context without touching the document.

use std::fmt;
use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;

use super::buffer::DocumentBuffer;
use super::format::LINK_ATTRIBUTES;
use super::{visual, Selection};
use crate::config::EditorMode;
use crate::dom::{Boundary, Dom, DomRange, NodeId};
use crate::markdown::is_unsafe_url;
use crate::string_utils::clamp_selection;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Why a submitted URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    EmptyUrl,
    UnsafeUrl,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::EmptyUrl => write!(f, "Please enter a URL."),
            LinkError::UnsafeUrl => write!(f, "That link is not allowed."),
        }
    }
}

impl std::error::Error for LinkError {}

/// A link that already exists under the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingLink {
    /// Byte span of `[text](url){:attrs}` in the source
    Markdown { start: usize, end: usize },
    /// Anchor element in the visual tree
    Anchor(NodeId),
}

/// State captured when the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    pub mode: EditorMode,
    pub selection: Selection,
    pub existing: Option<ExistingLink>,
    /// Text the selection or existing link shows
    pub text: String,
    /// URL of the existing link, if any
    pub url: String,
}

/// A markdown link found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLink {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub url: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Markdown helpers
// ─────────────────────────────────────────────────────────────────────────────

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)(\{:[^}]*\})?").expect("valid regex")
    })
}

/// Find the markdown link whose span covers `start..end`.
pub fn find_markdown_link(text: &str, start: usize, end: usize) -> Option<MarkdownLink> {
    markdown_link_re().captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if whole.start() <= start && end <= whole.end() {
            Some(MarkdownLink {
                start: whole.start(),
                end: whole.end(),
                text: caps[1].to_string(),
                url: caps[2].to_string(),
            })
        } else {
            None
        }
    })
}

/// Markdown for a dialog-created link.
pub fn markdown_link(text: &str, url: &str) -> String {
    format!("[{}]({}){}", text, url, LINK_ATTRIBUTES)
}

/// Trim a submitted URL and refuse empty or script URLs.
pub fn validate_url(url: &str) -> Result<&str, LinkError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LinkError::EmptyUrl);
    }
    if is_unsafe_url(url) {
        return Err(LinkError::UnsafeUrl);
    }
    Ok(url)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialog
// ─────────────────────────────────────────────────────────────────────────────

/// The link dialog: closed, or open with a captured context.
#[derive(Debug, Clone, Default)]
pub struct LinkDialog {
    context: Option<LinkContext>,
}

impl LinkDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&LinkContext> {
        self.context.as_ref()
    }

    /// Open the dialog for the buffer's current selection.
    pub fn open(&mut self, buffer: &DocumentBuffer) -> &LinkContext {
        let context = match buffer.selection() {
            Selection::Source { start, end } => source_context(buffer.source(), start, end),
            Selection::Visual(range) => visual_context(buffer.visual(), range),
        };
        debug!(
            "Link dialog opened in {} mode (existing link: {})",
            context.mode.label(),
            context.existing.is_some()
        );
        self.context.insert(context)
    }

    /// Discard the dialog without changing the document.
    pub fn cancel(&mut self) {
        if self.context.take().is_some() {
            debug!("Link dialog cancelled");
        }
    }

    /// Apply the link. On a URL error the dialog stays open.
    ///
    /// Returns whether the document changed. An empty `text` keeps the
    /// existing text, falling back to the selection and then the URL.
    pub fn submit(
        &mut self,
        buffer: &mut DocumentBuffer,
        url: &str,
        text: &str,
    ) -> Result<bool, LinkError> {
        let Some(context) = self.context.as_ref() else {
            return Ok(false);
        };
        let url = validate_url(url)?;
        let text = text.trim();

        let changed = match (&context.selection, context.mode == buffer.mode()) {
            (Selection::Source { start, end }, true) => {
                apply_source(buffer, context, *start, *end, url, text)
            }
            (Selection::Visual(range), true) => apply_visual(buffer, context, range, url, text),
            _ => {
                debug!("Editor mode changed while the link dialog was open");
                false
            }
        };
        self.context = None;
        if changed {
            info!("Link to {} applied", url);
        }
        Ok(changed)
    }
}

fn source_context(source: &str, start: usize, end: usize) -> LinkContext {
    let (start, end) = clamp_selection(source, start, end);
    let selection = Selection::Source { start, end };
    match find_markdown_link(source, start, end) {
        Some(link) => LinkContext {
            mode: EditorMode::Source,
            selection,
            existing: Some(ExistingLink::Markdown {
                start: link.start,
                end: link.end,
            }),
            text: link.text,
            url: link.url,
        },
        None => LinkContext {
            mode: EditorMode::Source,
            selection,
            existing: None,
            text: source[start..end].to_string(),
            url: String::new(),
        },
    }
}

fn visual_context(dom: &Dom, range: DomRange) -> LinkContext {
    let range = dom.normalize_range(&range).unwrap_or(range);
    let anchor = dom
        .common_ancestor(range.start.node, range.end.node)
        .and_then(|node| dom.closest(node, &["a"]));
    match anchor {
        Some(anchor) => LinkContext {
            mode: EditorMode::Visual,
            selection: Selection::Visual(range),
            existing: Some(ExistingLink::Anchor(anchor)),
            text: dom.text_content(anchor),
            url: dom.attr(anchor, "href").unwrap_or_default().to_string(),
        },
        None => LinkContext {
            mode: EditorMode::Visual,
            selection: Selection::Visual(range),
            existing: None,
            text: dom.range_text(&range),
            url: String::new(),
        },
    }
}

fn apply_source(
    buffer: &mut DocumentBuffer,
    context: &LinkContext,
    start: usize,
    end: usize,
    url: &str,
    text: &str,
) -> bool {
    let source = buffer.source();
    let (start, end) = clamp_selection(source, start, end);
    let (from, to) = match context.existing {
        Some(ExistingLink::Markdown { start, end }) => clamp_selection(source, start, end),
        _ => (start, end),
    };

    let display = [text, context.text.trim(), url]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(url);
    let link = markdown_link(display, url);
    let new_source = format!("{}{}{}", &source[..from], link, &source[to..]);

    buffer.replace_source(new_source);
    buffer.set_source_selection(from, from + link.len());
    true
}

fn apply_visual(
    buffer: &mut DocumentBuffer,
    context: &LinkContext,
    range: &DomRange,
    url: &str,
    text: &str,
) -> bool {
    let existing = match context.existing {
        Some(ExistingLink::Anchor(anchor))
            if buffer.visual().is_attached(anchor) && buffer.visual().has_tag(anchor, &["a"]) =>
        {
            Some(anchor)
        }
        _ => None,
    };
    let display = [text, context.text.trim(), url]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(url)
        .to_string();
    let range = *range;

    buffer.apply_visual(|dom, _| match existing {
        Some(anchor) => {
            visual::update_anchor(dom, anchor, url, &display);
            let after = dom.index_in_parent(anchor).map(|i| i + 1).unwrap_or(0);
            let parent = dom.parent(anchor).unwrap_or_else(|| dom.root());
            Some(DomRange::collapsed(Boundary::new(parent, after)))
        }
        None => match visual::insert_anchor(dom, &range, url, &display) {
            Ok(caret) => Some(caret),
            Err(err) => {
                debug!("Link insertion skipped: {}", err);
                None
            }
        },
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

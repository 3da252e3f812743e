//! Formatting spans shared by both editing modes
//!
//! A [`FormatSpan`] names a piece of formatting independently of how it is
//! written: in source mode it is a pair of markers or a line prefix, in the
//! visual tree it is an element.

/// Elements removed by "clear formatting".
pub const CLEAR_FORMAT_TAGS: &[&str] = &["a", "b", "strong", "i", "em", "u"];

/// Attribute list appended to links created by the link dialog.
pub const LINK_ATTRIBUTES: &str = r#"{:target="_blank" rel="noopener noreferrer"}"#;

/// Formatting that can be applied to a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpan {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    /// Link to the given URL
    Link(String),
    OrderedListItem,
    UnorderedListItem,
}

impl FormatSpan {
    /// Element created for this span in the visual tree.
    pub fn tag(&self) -> &'static str {
        match self {
            FormatSpan::Bold => "strong",
            FormatSpan::Italic => "em",
            FormatSpan::Underline => "u",
            FormatSpan::Strikethrough => "s",
            FormatSpan::Link(_) => "a",
            FormatSpan::OrderedListItem => "ol",
            FormatSpan::UnorderedListItem => "ul",
        }
    }

    /// Every element that counts as this span when deciding whether to
    /// remove it instead of adding it.
    pub fn tag_set(&self) -> &'static [&'static str] {
        match self {
            FormatSpan::Bold => &["b", "strong"],
            FormatSpan::Italic => &["i", "em"],
            FormatSpan::Underline => &["u"],
            FormatSpan::Strikethrough => &["s", "strike", "del"],
            FormatSpan::Link(_) => &["a"],
            FormatSpan::OrderedListItem => &["ol"],
            FormatSpan::UnorderedListItem => &["ul"],
        }
    }

    /// Whether this span is a list (stacks instead of toggling).
    pub fn is_list(&self) -> bool {
        matches!(self, FormatSpan::OrderedListItem | FormatSpan::UnorderedListItem)
    }

    /// Markers written around the selection in source mode. Lists have
    /// none; they are line prefixes.
    pub fn source_wrapper(&self) -> Option<(String, String)> {
        let pair = |before: &str, after: &str| Some((before.to_string(), after.to_string()));
        match self {
            FormatSpan::Bold => pair("**", "**"),
            FormatSpan::Italic => pair("*", "*"),
            FormatSpan::Underline => pair("<u>", "</u>"),
            FormatSpan::Strikethrough => pair("~~", "~~"),
            FormatSpan::Link(url) => Some(("[".to_string(), format!("]({}){}", url, LINK_ATTRIBUTES))),
            FormatSpan::OrderedListItem | FormatSpan::UnorderedListItem => None,
        }
    }

    /// Human-readable name for toolbars and logs.
    pub fn label(&self) -> &'static str {
        match self {
            FormatSpan::Bold => "Bold",
            FormatSpan::Italic => "Italic",
            FormatSpan::Underline => "Underline",
            FormatSpan::Strikethrough => "Strikethrough",
            FormatSpan::Link(_) => "Link",
            FormatSpan::OrderedListItem => "Numbered list",
            FormatSpan::UnorderedListItem => "Bulleted list",
        }
    }

    /// Keyboard shortcut shown next to the label, if any.
    pub fn shortcut_label(&self) -> Option<&'static str> {
        match self {
            FormatSpan::Bold => Some("Ctrl+B"),
            FormatSpan::Italic => Some("Ctrl+I"),
            FormatSpan::Underline => Some("Ctrl+U"),
            FormatSpan::Strikethrough => Some("Ctrl+Shift+X"),
            FormatSpan::Link(_) => Some("Ctrl+K"),
            FormatSpan::OrderedListItem | FormatSpan::UnorderedListItem => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

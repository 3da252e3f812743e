//! Keyboard shortcuts for the editor view.

use crate::editor::FormatSpan;

/// A key the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Char(char),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub fn ctrl(key: char) -> Self {
        Self {
            key: Key::Char(key),
            ctrl: true,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Editor commands reachable from the toolbar or the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    /// Toggle bold (Ctrl+B)
    Bold,
    /// Toggle italic (Ctrl+I)
    Italic,
    /// Toggle underline (Ctrl+U)
    Underline,
    /// Toggle strikethrough (Ctrl+Shift+X)
    Strikethrough,
    /// Open the link dialog (Ctrl+K)
    Link,
    OrderedList,
    UnorderedList,
    /// Indent the selected lines or blocks (Tab)
    Indent,
    /// Outdent the selected lines or blocks (Shift+Tab)
    Outdent,
    ClearFormatting,
    /// Switch between visual and source mode (Ctrl+E)
    ToggleMode,
    /// Save as draft (Ctrl+S)
    SaveDraft,
    Publish,
}

impl EditorAction {
    /// Resolve a key press to an action.
    pub fn from_chord(chord: &KeyChord) -> Option<Self> {
        match (chord.key, chord.ctrl, chord.shift) {
            (Key::Tab, false, false) => Some(EditorAction::Indent),
            (Key::Tab, false, true) => Some(EditorAction::Outdent),
            (Key::Char(c), true, shift) => match (c.to_ascii_lowercase(), shift) {
                ('b', false) => Some(EditorAction::Bold),
                ('i', false) => Some(EditorAction::Italic),
                ('u', false) => Some(EditorAction::Underline),
                ('x', true) => Some(EditorAction::Strikethrough),
                ('k', false) => Some(EditorAction::Link),
                ('e', false) => Some(EditorAction::ToggleMode),
                ('s', false) => Some(EditorAction::SaveDraft),
                _ => None,
            },
            _ => None,
        }
    }

    /// The span an inline or list action applies. Links need a URL and go
    /// through the dialog instead.
    pub fn format_span(&self) -> Option<FormatSpan> {
        match self {
            EditorAction::Bold => Some(FormatSpan::Bold),
            EditorAction::Italic => Some(FormatSpan::Italic),
            EditorAction::Underline => Some(FormatSpan::Underline),
            EditorAction::Strikethrough => Some(FormatSpan::Strikethrough),
            EditorAction::OrderedList => Some(FormatSpan::OrderedListItem),
            EditorAction::UnorderedList => Some(FormatSpan::UnorderedListItem),
            _ => None,
        }
    }

    pub fn shortcut_label(&self) -> Option<&'static str> {
        match self {
            EditorAction::Indent => Some("Tab"),
            EditorAction::Outdent => Some("Shift+Tab"),
            EditorAction::ToggleMode => Some("Ctrl+E"),
            EditorAction::SaveDraft => Some("Ctrl+S"),
            EditorAction::Link => FormatSpan::Link(String::new()).shortcut_label(),
            other => other.format_span().and_then(|span| span.shortcut_label()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chords_resolve() {
        let cases = [
            (KeyChord::new(Key::Tab), EditorAction::Indent),
            (KeyChord::new(Key::Tab).with_shift(), EditorAction::Outdent),
            (KeyChord::ctrl('b'), EditorAction::Bold),
            (KeyChord::ctrl('I'), EditorAction::Italic),
            (KeyChord::ctrl('u'), EditorAction::Underline),
            (KeyChord::ctrl('x').with_shift(), EditorAction::Strikethrough),
            (KeyChord::ctrl('k'), EditorAction::Link),
            (KeyChord::ctrl('e'), EditorAction::ToggleMode),
            (KeyChord::ctrl('s'), EditorAction::SaveDraft),
        ];
        for (chord, action) in cases {
            assert_eq!(EditorAction::from_chord(&chord), Some(action), "{:?}", chord);
        }
    }

    #[test]
    fn test_unbound_chords() {
        assert_eq!(EditorAction::from_chord(&KeyChord::ctrl('x')), None);
        assert_eq!(EditorAction::from_chord(&KeyChord::new(Key::Char('b'))), None);
        assert_eq!(
            EditorAction::from_chord(&KeyChord::ctrl('b').with_shift()),
            None
        );
    }

    #[test]
    fn test_labels_match_bindings() {
        assert_eq!(EditorAction::Strikethrough.shortcut_label(), Some("Ctrl+Shift+X"));
        assert_eq!(EditorAction::Link.shortcut_label(), Some("Ctrl+K"));
        assert_eq!(EditorAction::Outdent.shortcut_label(), Some("Shift+Tab"));
        assert_eq!(EditorAction::Publish.shortcut_label(), None);
    }
}

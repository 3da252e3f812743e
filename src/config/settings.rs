//! User settings and preferences for Quire
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence and environment
//! overrides for the repository and git identity.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Toggle between light and dark.
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Stored value, also used as the `data-theme` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Icon for the toggle button: shows the theme you would switch to.
    pub fn toggle_icon(&self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "🌞",
        }
    }

    /// Accessible label for the toggle button.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Light => "Switch to dark mode",
            Theme::Dark => "Switch to light mode",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor Mode Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// The two editing surfaces of a document.
///
/// - `Visual`: the rendered, sanitized document tree
/// - `Source`: raw markdown text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Visual,
    Source,
}

impl EditorMode {
    /// Toggle between Visual and Source modes.
    pub fn toggle(&self) -> Self {
        match self {
            EditorMode::Visual => EditorMode::Source,
            EditorMode::Source => EditorMode::Visual,
        }
    }

    /// Get a display label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            EditorMode::Visual => "Visual",
            EditorMode::Source => "Source",
        }
    }

    /// Label of the mode toggle button, naming the mode it switches to.
    pub fn toggle_label(&self) -> &'static str {
        self.toggle().label()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository and Git
// ─────────────────────────────────────────────────────────────────────────────

/// Where the blog lives and how new posts are attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RepositorySettings {
    /// Blog root containing `_posts/` and `_drafts/`; current dir when unset
    pub root: Option<PathBuf>,

    /// Author written into new posts' front matter (empty = none)
    pub default_author: String,
}

/// Auto-commit behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Commit after every save, publish and delete
    pub enabled: bool,

    /// Identity used for commits; both must be set or commits are skipped
    pub user_name: String,
    pub user_email: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            user_name: String::new(),
            user_email: String::new(),
        }
    }
}

impl GitSettings {
    /// Check whether a commit identity is configured.
    pub fn has_identity(&self) -> bool {
        !self.user_name.trim().is_empty() && !self.user_email.trim().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Application settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Appearance
    // ─────────────────────────────────────────────────────────────────────────
    /// Color theme
    pub theme: Theme,

    /// Mode a freshly opened editor starts in
    pub default_mode: EditorMode,

    /// How long a toast stays visible, in milliseconds
    pub toast_duration_ms: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────
    pub repository: RepositorySettings,

    pub git: GitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            default_mode: EditorMode::default(),
            toast_duration_ms: Self::DEFAULT_TOAST_MS,
            repository: RepositorySettings::default(),
            git: GitSettings::default(),
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Default toast duration.
    pub const DEFAULT_TOAST_MS: u64 = 4000;
    /// Minimum toast duration.
    pub const MIN_TOAST_MS: u64 = 500;
    /// Maximum toast duration.
    pub const MAX_TOAST_MS: u64 = 60_000;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.toast_duration_ms = self
            .toast_duration_ms
            .clamp(Self::MIN_TOAST_MS, Self::MAX_TOAST_MS);

        self.repository.default_author = self.repository.default_author.trim().to_string();
        self.git.user_name = self.git.user_name.trim().to_string();
        self.git.user_email = self.git.user_email.trim().to_string();

        // An empty path means "not configured"
        if self
            .repository
            .root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            self.repository.root = None;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Environment Overrides
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply `BLOG_REPO_ROOT`, `DEFAULT_AUTHOR`, `GIT_ENABLED`,
    /// `GIT_USER_NAME` and `GIT_USER_EMAIL` from `lookup`.
    ///
    /// Takes a lookup function so callers can pass `std::env::var` or a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("BLOG_REPO_ROOT").filter(|v| !v.trim().is_empty()) {
            self.repository.root = Some(PathBuf::from(root));
        }
        if let Some(author) = lookup("DEFAULT_AUTHOR") {
            self.repository.default_author = author;
        }
        if let Some(enabled) = lookup("GIT_ENABLED") {
            self.git.enabled = !enabled.trim().eq_ignore_ascii_case("false");
        }
        if let Some(name) = lookup("GIT_USER_NAME") {
            self.git.user_name = name;
        }
        if let Some(email) = lookup("GIT_USER_EMAIL") {
            self.git.user_email = email;
        }
        self.sanitize();
    }

    /// Repository root, falling back to the current directory.
    pub fn repository_root(&self) -> PathBuf {
        self.repository
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.default_mode, EditorMode::Visual);
        assert_eq!(settings.toast_duration_ms, 4000);
        assert!(settings.git.enabled);
        assert!(!settings.git.has_identity());
        assert!(settings.repository.root.is_none());
    }

    #[test]
    fn test_theme_serialization() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let theme: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Light.toggle_label(), "Switch to dark mode");
    }

    #[test]
    fn test_editor_mode_toggle() {
        assert_eq!(EditorMode::Visual.toggle(), EditorMode::Source);
        assert_eq!(EditorMode::Source.toggle(), EditorMode::Visual);
        // The button names the mode it switches to
        assert_eq!(EditorMode::Visual.toggle_label(), "Source");
        assert_eq!(EditorMode::Source.toggle_label(), "Visual");
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let mut settings = Settings::default();
        settings.theme = Theme::Dark;
        settings.repository.default_author = "Ada".to_string();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.toast_duration_ms, 4000);
        assert!(settings.git.enabled);
    }

    #[test]
    fn test_sanitize_toast_duration() {
        let settings = Settings::from_json_sanitized(r#"{"toast_duration_ms": 5}"#).unwrap();
        assert_eq!(settings.toast_duration_ms, Settings::MIN_TOAST_MS);
        let settings = Settings::from_json_sanitized(r#"{"toast_duration_ms": 999999}"#).unwrap();
        assert_eq!(settings.toast_duration_ms, Settings::MAX_TOAST_MS);
    }

    #[test]
    fn test_sanitize_empty_root() {
        let settings =
            Settings::from_json_sanitized(r#"{"repository": {"root": ""}}"#).unwrap();
        assert!(settings.repository.root.is_none());
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            ("BLOG_REPO_ROOT", "/srv/blog"),
            ("DEFAULT_AUTHOR", " Grace "),
            ("GIT_ENABLED", "FALSE"),
            ("GIT_USER_NAME", "Grace"),
            ("GIT_USER_EMAIL", "grace@example.com"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.repository_root(), PathBuf::from("/srv/blog"));
        assert_eq!(settings.repository.default_author, "Grace");
        assert!(!settings.git.enabled);
        assert!(settings.git.has_identity());
    }

    #[test]
    fn test_apply_env_keeps_values_when_unset() {
        let mut settings = Settings::default();
        settings.git.user_name = "Kept".to_string();
        settings.apply_env(|_| None);
        assert_eq!(settings.git.user_name, "Kept");
        assert!(settings.git.enabled);
        assert_eq!(settings.repository_root(), PathBuf::from("."));
    }
}

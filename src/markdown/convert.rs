//! Markdown ↔ HTML conversion
//!
//! Rendering goes through comrak with GitHub Flavored Markdown extensions
//! and hard line breaks, so a single newline in the source shows up as a
//! break in the visual editor. Kramdown attribute lists written after a
//! link (`[t](u){:target="_blank"}`) are folded into the anchor.
//!
//! The reverse direction checks the tree for visible content and hands its
//! HTML to html2md with the editor's own tag handlers.

use std::sync::OnceLock;

use comrak::{markdown_to_html, Options};
use log::debug;
use regex::Regex;

use super::serialize;
use crate::dom::{Dom, NodeId};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown rendering.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
    /// Render single newlines as `<br>`
    pub hardbreaks: bool,
    /// Pass raw HTML through (the sanitizer runs afterwards)
    pub raw_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            hardbreaks: true,
            raw_html: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;

        options.render.hardbreaks = self.hardbreaks;
        options.render.unsafe_ = self.raw_html;
        // `<pre lang="..">` keeps the fence info string for the way back
        options.render.github_pre_lang = true;

        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Markdown → HTML
// ─────────────────────────────────────────────────────────────────────────────

/// Render markdown to HTML. Empty input renders to an empty string.
pub fn to_html(markdown: &str) -> String {
    to_html_with_options(markdown, &MarkdownOptions::default())
}

/// Render markdown to HTML with custom options.
pub fn to_html_with_options(markdown: &str, options: &MarkdownOptions) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    markdown_to_dom_with_options(markdown, options).html()
}

/// Render markdown straight into a document tree (not sanitized).
pub fn markdown_to_dom(markdown: &str) -> Dom {
    markdown_to_dom_with_options(markdown, &MarkdownOptions::default())
}

fn markdown_to_dom_with_options(markdown: &str, options: &MarkdownOptions) -> Dom {
    if markdown.trim().is_empty() {
        return Dom::new();
    }
    let html = markdown_to_html(markdown, &options.to_comrak_options());
    let mut dom = Dom::parse(&html);
    fold_link_attributes(&mut dom);
    dom
}

fn attribute_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{:([^}]*)\}").expect("valid regex"))
}

fn attribute_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("valid regex")
    })
}

/// Parse the body of `{:...}` into attribute pairs. Anything that is not a
/// `key="value"` pair makes the whole list invalid.
fn parse_attribute_list(body: &str) -> Option<Vec<(String, String)>> {
    let pairs = attribute_pair_re();
    let leftover = pairs.replace_all(body, "");
    if !leftover.trim().is_empty() {
        return None;
    }
    let attrs: Vec<(String, String)> = pairs
        .captures_iter(body)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), value.to_string())
        })
        .collect();
    if attrs.is_empty() {
        None
    } else {
        Some(attrs)
    }
}

/// Move `{:key="value"}` text that directly follows an anchor onto it.
fn fold_link_attributes(dom: &mut Dom) {
    let anchors: Vec<NodeId> = dom
        .descendants(dom.root())
        .into_iter()
        .filter(|&node| dom.has_tag(node, &["a"]))
        .collect();

    for anchor in anchors {
        let Some(next) = dom.next_sibling(anchor) else {
            continue;
        };
        let Some(text) = dom.text(next) else {
            continue;
        };
        let Some(caps) = attribute_list_re().captures(text) else {
            continue;
        };
        let consumed = caps[0].len();
        let Some(attrs) = parse_attribute_list(&caps[1]) else {
            continue;
        };

        let rest = text[consumed..].to_string();
        for (key, value) in attrs {
            dom.set_attr(anchor, &key, &value);
        }
        if rest.is_empty() {
            dom.detach(next);
        } else {
            dom.set_text(next, &rest);
        }
        debug!("Folded link attribute list into anchor");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML → Markdown
// ─────────────────────────────────────────────────────────────────────────────

/// Convert HTML to markdown.
///
/// Markup that shows nothing (`<p><br></p>`, `&nbsp;`, empty paragraphs)
/// converts to an empty string.
pub fn to_markdown(html: &str) -> String {
    dom_to_markdown(&Dom::parse(html))
}

/// Convert a document tree to markdown.
pub fn dom_to_markdown(dom: &Dom) -> String {
    if dom.is_visibly_empty(dom.root()) {
        return String::new();
    }
    let html = dom.html().replace("&nbsp;", " ");
    serialize::serialize(&html)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

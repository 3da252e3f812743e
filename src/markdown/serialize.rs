//! HTML to markdown through html2md
//!
//! html2md writes paragraphs, emphasis, lists, quotes, tables and images.
//! The handlers here replace its defaults where the editor writes a
//! different markdown:
//!
//! - headings are always ATX (`## Title`)
//! - `<pre>` becomes a fenced block carrying comrak's `lang` attribute
//! - `<u>` stays an HTML tag (html2md would emit `__`, which is bold)
//! - anchors get a kramdown attribute list when they carry `target`/`rel`
//! - task list checkboxes become `[ ]` / `[x]`

use std::collections::HashMap;

use html2md::common::get_tag_attr;
use html2md::{parse_html_custom, Handle, StructuredPrinter, TagHandler, TagHandlerFactory};

/// Convert an HTML fragment to markdown.
pub fn serialize(html: &str) -> String {
    parse_html_custom(html, &handlers()).trim().to_string()
}

/// Kramdown inline attribute list for an anchor's `target` and `rel`.
pub fn link_attribute_list(target: Option<&str>, rel: Option<&str>) -> Option<String> {
    let parts: Vec<String> = [("target", target), ("rel", rel)]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}=\"{}\"", name, v))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("{{:{}}}", parts.join(" ")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler registry
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a fresh handler for every matching element.
struct Factory<F>(F);

impl<F> TagHandlerFactory for Factory<F>
where
    F: Fn() -> Box<dyn TagHandler>,
{
    fn instantiate(&self) -> Box<dyn TagHandler> {
        (self.0)()
    }
}

fn factory<F>(build: F) -> Box<dyn TagHandlerFactory>
where
    F: Fn() -> Box<dyn TagHandler> + 'static,
{
    Box::new(Factory(build))
}

fn handlers() -> HashMap<String, Box<dyn TagHandlerFactory>> {
    let mut map: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
    for level in 1..=6 {
        map.insert(
            format!("h{}", level),
            factory(move || Box::new(HeadingHandler::new(level))),
        );
    }
    map.insert("pre".into(), factory(|| Box::<CodeBlockHandler>::default()));
    map.insert("code".into(), factory(|| Box::<InlineCodeHandler>::default()));
    map.insert("u".into(), factory(|| Box::<UnderlineHandler>::default()));
    map.insert("a".into(), factory(|| Box::<LinkHandler>::default()));
    map.insert("input".into(), factory(|| Box::new(CheckboxHandler)));
    map
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocks
// ─────────────────────────────────────────────────────────────────────────────

struct HeadingHandler {
    level: usize,
    start: usize,
}

impl HeadingHandler {
    fn new(level: usize) -> Self {
        Self { level, start: 0 }
    }
}

impl TagHandler for HeadingHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        printer.append_str("\n\n");
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        // Headings are a single line
        let content = printer.data[self.start..]
            .replace("  \n", " ")
            .replace('\n', " ")
            .trim()
            .to_string();
        printer.data.truncate(self.start);
        if !content.is_empty() {
            printer.append_str(&format!("{} {}\n\n", "#".repeat(self.level), content));
        }
    }
}

#[derive(Default)]
struct CodeBlockHandler {
    language: String,
    start: usize,
}

impl TagHandler for CodeBlockHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        self.language = get_tag_attr(tag, "lang").unwrap_or_default();
        printer.append_str("\n\n");
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let code = printer.data[self.start..].to_string();
        let code = code.strip_suffix('\n').unwrap_or(&code);
        let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
        let block = format!("{}{}\n{}\n{}\n\n", fence, self.language, code, fence);
        printer.data.truncate(self.start);
        printer.append_str(&block);
    }
}

/// `[ ]` / `[x]` for task list items; other inputs vanish.
struct CheckboxHandler;

impl TagHandler for CheckboxHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        if get_tag_attr(tag, "type").as_deref() != Some("checkbox") {
            return;
        }
        if get_tag_attr(tag, "checked").is_some() {
            printer.append_str("[x]");
        } else {
            printer.append_str("[ ]");
        }
    }

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}

    fn skip_descendants(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inlines
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct InlineCodeHandler {
    start: usize,
}

impl TagHandler for InlineCodeHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let code = printer.data[self.start..].to_string();
        if code.is_empty() {
            return;
        }
        let fence = "`".repeat(longest_run(&code, '`') + 1);
        let pad = if code.starts_with('`') || code.ends_with('`') {
            " "
        } else {
            ""
        };
        printer.data.truncate(self.start);
        printer.append_str(&format!("{}{}{}{}{}", fence, pad, code, pad, fence));
    }
}

#[derive(Default)]
struct UnderlineHandler {
    start: usize,
}

impl TagHandler for UnderlineHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let inner = printer.data[self.start..].to_string();
        if inner.trim().is_empty() {
            return;
        }
        printer.data.truncate(self.start);
        printer.append_str(&format!("<u>{}</u>", inner));
    }
}

#[derive(Default)]
struct LinkHandler {
    start: usize,
    href: String,
    title: Option<String>,
    attributes: Option<String>,
}

impl TagHandler for LinkHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        self.start = printer.data.len();
        self.href = get_tag_attr(tag, "href").unwrap_or_default().trim().to_string();
        self.title = get_tag_attr(tag, "title").filter(|t| !t.is_empty());
        self.attributes = link_attribute_list(
            get_tag_attr(tag, "target").as_deref(),
            get_tag_attr(tag, "rel").as_deref(),
        );
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let text = printer.data[self.start..].trim().to_string();
        let href = self.href.as_str();
        if href.is_empty() {
            return;
        }
        if self.attributes.is_none()
            && self.title.is_none()
            && text == href
            && (href.starts_with("http://") || href.starts_with("https://"))
        {
            // Rendered again as an autolink
            return;
        }

        let destination = if href.contains(char::is_whitespace) || !balanced_parens(href) {
            format!("<{}>", href)
        } else {
            href.to_string()
        };
        let title = self
            .title
            .as_ref()
            .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
            .unwrap_or_default();
        let link = format!(
            "[{}]({}{}){}",
            text,
            destination,
            title,
            self.attributes.as_deref().unwrap_or_default()
        );
        printer.data.truncate(self.start);
        printer.append_str(&link);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn longest_run(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn balanced_parens(text: &str) -> bool {
    let mut depth: i32 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Text helpers for post files: slugs, excerpts and tag normalization.

use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

/// Longest excerpt when the body has no complete sentence, in characters.
pub const EXCERPT_FALLBACK_CHARS: usize = 200;

/// Turn a title into a filename slug; never empty.
pub fn slugify(value: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lowered: String = value
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect();
    let slug = non_alnum.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Plain-text preview of a markdown body.
///
/// Code, images, links and HTML tags are stripped; the first two sentences
/// are kept, or the first [`EXCERPT_FALLBACK_CHARS`] characters when no
/// sentence ends.
pub fn excerpt(content: &str) -> String {
    static STRIP: OnceLock<Vec<Regex>> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static SENTENCE: OnceLock<Regex> = OnceLock::new();

    let strip = STRIP.get_or_init(|| {
        [
            r"(?s)```.*?```",
            r"`[^`]*`",
            r"!\[[^\]]*\]\([^)]*\)",
            r"\[[^\]]*\]\([^)]*\)",
            r"<[^>]+>",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
    });
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let sentence = SENTENCE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid regex"));

    let mut cleaned = content.to_string();
    for pattern in strip {
        cleaned = pattern.replace_all(&cleaned, " ").into_owned();
    }
    let cleaned = whitespace.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return String::new();
    }

    let sentences: Vec<&str> = sentence
        .find_iter(cleaned)
        .take(2)
        .map(|m| m.as_str().trim())
        .collect();
    if !sentences.is_empty() {
        return sentences.join(" ");
    }

    cleaned
        .chars()
        .take(EXCERPT_FALLBACK_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Tags from a front matter value: a sequence or a comma-separated string.
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(text)) => text.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Front matter scalar as display text.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Don't \"quote\" me"), "dont-quote-me");
        assert_eq!(slugify("  --Rust 2024--  "), "rust-2024");
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn test_excerpt_keeps_two_sentences() {
        let body = "First one. Second *one*! Third one?";
        assert_eq!(excerpt(body), "First one. Second *one*!");
    }

    #[test]
    fn test_excerpt_strips_code_links_and_tags() {
        let body = "See [docs](http://x.com) and ![img](a.png).\n\n```\ncode. here.\n```\n<u>Done</u> `x.y` now.";
        assert_eq!(excerpt(body), "See and . Done now.");
    }

    #[test]
    fn test_excerpt_fallback_without_sentence_end() {
        let body = "word ".repeat(100);
        let result = excerpt(&body);
        assert!(result.chars().count() <= EXCERPT_FALLBACK_CHARS);
        assert!(result.starts_with("word word"));
        assert_eq!(excerpt("   "), "");
    }

    #[test]
    fn test_normalize_tags() {
        let list: Value = serde_yaml::from_str("[rust, ' web ', 2024, '']").unwrap();
        assert_eq!(normalize_tags(Some(&list)), vec!["rust", "web", "2024"]);

        let text = Value::String("a, b,,c ".to_string());
        assert_eq!(normalize_tags(Some(&text)), vec!["a", "b", "c"]);

        assert!(normalize_tags(None).is_empty());
        assert!(normalize_tags(Some(&Value::Bool(true))).is_empty());
    }
}

//! HTML sanitizer for the visual surface
//!
//! Everything that ends up in the visual tree from outside (loaded posts,
//! converted source, inserted links) is cleaned by an [`ammonia`] policy:
//! an allowlist of the elements comrak and the editor produce, with
//! script-capable elements dropped together with their content. URL
//! attributes go through an extra filter that undoes percent-encoding
//! before looking at the scheme.
//!
//! Cleaning can be compiled out by disabling the `sanitize` feature. In
//! that build markup passes through unchanged and a warning is logged on
//! every call. URL classification stays available because the link dialog
//! and source-mode links depend on it.

#[cfg(feature = "sanitize")]
use std::collections::{HashMap, HashSet};

use crate::dom::{Dom, NodeId};

/// Elements removed together with their content.
pub const BLOCKED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "frame", "frameset", "applet", "link",
    "meta", "base", "form", "noscript", "template", "svg", "math",
];

/// Elements kept in the visual tree. Anything else is unwrapped.
#[cfg(feature = "sanitize")]
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "code", "ul",
    "ol", "li", "strong", "b", "em", "i", "u", "s", "strike", "del", "ins", "a", "img", "span",
    "div", "sub", "sup", "mark", "small", "table", "thead", "tbody", "tr", "th", "td", "input",
    "dl", "dt", "dd", "figure", "figcaption", "section", "article",
];

/// Attributes allowed on every kept element.
#[cfg(feature = "sanitize")]
const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "title", "lang", "dir"];

/// Attributes allowed per element, on top of the generic ones.
#[cfg(feature = "sanitize")]
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "target", "rel", "name"]),
    ("img", &["src", "srcset", "alt", "width", "height"]),
    ("ol", &["start", "type"]),
    ("li", &["value"]),
    ("th", &["align", "colspan", "rowspan", "scope"]),
    ("td", &["align", "colspan", "rowspan"]),
    ("input", &["type", "checked", "disabled"]),
    ("blockquote", &["cite"]),
];

/// Schemes a URL attribute may use. `data:` is narrowed further by
/// [`is_blocked_attribute_url`].
#[cfg(feature = "sanitize")]
const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp", "data"];

/// Attributes holding URLs.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

/// Protocols that are never allowed.
const CRITICAL_PROTOCOLS: [&str; 2] = ["vbscript:", "data:"];

/// Raster image types allowed as inline `data:` images.
const SAFE_DATA_IMAGES: [&str; 5] = [
    "data:image/png",
    "data:image/gif",
    "data:image/jpeg",
    "data:image/jpg",
    "data:image/webp",
];

/// How many rounds of percent-decoding are applied before classifying.
const MAX_DECODE_ROUNDS: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// URL classification
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlSafety {
    Safe,
    /// Script URL (`javascript:`)
    Unsafe,
    /// Other code-bearing protocol (`vbscript:`, `data:`)
    Critical,
}

/// Lowercase the URL and drop control and whitespace characters, which
/// browsers ignore when resolving a protocol.
fn strip_ignored(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Every form the URL takes while it is percent-decoded, original first.
fn decoded_forms(url: &str) -> Vec<String> {
    let mut forms = vec![strip_ignored(url)];
    let mut current = url.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = urlencoding::decode_binary(current.as_bytes());
        let decoded = String::from_utf8_lossy(&decoded).into_owned();
        if decoded == current {
            break;
        }
        forms.push(strip_ignored(&decoded));
        current = decoded;
    }
    forms
}

fn classify_url(url: &str) -> UrlSafety {
    let forms = decoded_forms(url);
    if forms.iter().any(|form| form.starts_with("javascript:")) {
        return UrlSafety::Unsafe;
    }
    for form in &forms {
        for proto in CRITICAL_PROTOCOLS {
            if form.starts_with(proto) {
                return UrlSafety::Critical;
            }
        }
    }
    UrlSafety::Safe
}

/// Check whether a URL would execute script when followed.
///
/// Control and whitespace characters are ignored and up to five rounds of
/// percent-encoding are undone before looking for a `javascript:` scheme,
/// in any letter case.
pub fn is_unsafe_url(url: &str) -> bool {
    classify_url(url) == UrlSafety::Unsafe
}

/// URL check applied to attributes: also refuses `vbscript:` and `data:`
/// except raster images in `src`.
fn is_blocked_attribute_url(attr: &str, url: &str) -> bool {
    match classify_url(url) {
        UrlSafety::Safe => false,
        UrlSafety::Unsafe => true,
        UrlSafety::Critical => {
            let normalized = strip_ignored(url);
            let inline_image = attr == "src"
                && SAFE_DATA_IMAGES
                    .iter()
                    .any(|prefix| normalized.starts_with(prefix));
            !inline_image
        }
    }
}

fn is_blocked_srcset(value: &str) -> bool {
    value
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .any(|url| is_blocked_attribute_url("src", url))
}

/// Whether an allowed attribute carries a value that must not survive.
fn is_blocked_attribute(name: &str, value: &str) -> bool {
    if name == "srcset" {
        is_blocked_srcset(value)
    } else if URL_ATTRIBUTES.contains(&name) {
        is_blocked_attribute_url(name, value)
    } else {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cleaning
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sanitize")]
fn cleaner() -> ammonia::Builder<'static> {
    let tag_attributes: HashMap<&str, HashSet<&str>> = TAG_ATTRIBUTES
        .iter()
        .map(|&(tag, attrs)| (tag, attrs.iter().copied().collect()))
        .collect();

    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .clean_content_tags(BLOCKED_TAGS.iter().copied().collect())
        .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .url_schemes(URL_SCHEMES.iter().copied().collect())
        // Links keep the `rel` they were written with
        .link_rel(None)
        .attribute_filter(|_element, attribute, value| {
            if is_blocked_attribute(attribute, value) {
                None
            } else {
                Some(value.into())
            }
        });
    builder
}

#[cfg(feature = "sanitize")]
fn is_allowed_attribute(tag: &str, name: &str) -> bool {
    GENERIC_ATTRIBUTES.contains(&name)
        || TAG_ATTRIBUTES
            .iter()
            .any(|&(t, attrs)| t == tag && attrs.contains(&name))
}

/// Sanitize an HTML string.
#[cfg(feature = "sanitize")]
pub fn sanitize(html: &str) -> String {
    cleaner().clean(html).to_string()
}

/// Pass-through used when the `sanitize` feature is disabled.
#[cfg(not(feature = "sanitize"))]
pub fn sanitize(html: &str) -> String {
    log::warn!("HTML sanitizer is disabled; markup is inserted unfiltered");
    html.to_string()
}

/// Sanitize the subtree under `node` in place.
///
/// The node itself is kept (callers hold on to its id) and only loses
/// disallowed attributes; its content is replaced by the cleaned markup
/// when cleaning changed anything. Returns whether anything was removed.
#[cfg(feature = "sanitize")]
pub fn sanitize_dom(dom: &mut Dom, node: NodeId) -> bool {
    let mut changed = false;

    if let Some(tag) = dom.tag(node).map(str::to_string) {
        let before = dom.attrs(node).len();
        dom.retain_attrs(node, |name, value| {
            is_allowed_attribute(&tag, name) && !is_blocked_attribute(name, value)
        });
        changed |= dom.attrs(node).len() != before;
    }

    let inner = dom.inner_html(node);
    let cleaned = cleaner().clean(&inner).to_string();
    if cleaned != inner {
        dom.set_inner_html(node, &cleaned);
        changed = true;
    }

    if changed {
        log::debug!("Sanitizer removed unsafe markup");
    }
    changed
}

/// Pass-through used when the `sanitize` feature is disabled.
#[cfg(not(feature = "sanitize"))]
pub fn sanitize_dom(_dom: &mut Dom, _node: NodeId) -> bool {
    log::warn!("HTML sanitizer is disabled; markup is inserted unfiltered");
    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

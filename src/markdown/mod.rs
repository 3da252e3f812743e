//! Markdown conversion and HTML sanitizing
//!
//! This module keeps the two document representations translatable:
//! markdown source is rendered with comrak into a [`crate::dom::Dom`], and
//! a tree is serialized back into markdown. Everything rendered for the
//! visual surface is sanitized first.
//!
//! # Example
//! ```ignore
//! use quire::markdown::{sanitize, to_html, to_markdown};
//!
//! let html = sanitize(&to_html("Hello **world**"));
//! assert_eq!(to_markdown(&html), "Hello **world**");
//! ```

mod convert;
mod sanitize;
mod serialize;

pub use convert::{
    dom_to_markdown, markdown_to_dom, to_html, to_html_with_options, to_markdown, MarkdownOptions,
};
pub use sanitize::{is_unsafe_url, sanitize, sanitize_dom, BLOCKED_TAGS};
pub use serialize::link_attribute_list;

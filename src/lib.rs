//! Quire - Editor core for a static-site blog
//!
//! Quire edits markdown posts with YAML front matter in a Jekyll-style
//! repository. A post body is edited in two equivalent forms, markdown
//! source and a sanitized visual tree, with selection-aware formatting and
//! a link dialog for both. Posts are stored through the [`api::ContentApi`]
//! trait; [`content::Repository`] implements it over the file system with
//! git auto-commit.
//!
//! # Modules
//! - `dom` - arena document tree and range surgery
//! - `markdown` - markdown/HTML conversion and sanitizing
//! - `editor` - document buffer, formatting and the link dialog
//! - `session` - editor session controller (views, saving, routing)
//! - `api` / `content` - content contract and its file-backed implementation
//! - `config` / `error` - settings persistence and the crate error type

pub mod api;
pub mod config;
pub mod content;
pub mod dom;
pub mod editor;
pub mod error;
pub mod markdown;
pub mod session;
pub mod string_utils;

pub use error::{Error, Result};

//! Content API contract
//!
//! The editor session talks to post storage only through [`ContentApi`].
//! The request and response types mirror the JSON the blog backend speaks,
//! so they serialize with the same field names (`commitStatus`, snake_case
//! statuses) and can be sent over any transport.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Statuses
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a post lives in `_drafts/` or `_posts/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    /// Label shown on post cards.
    pub fn label(&self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Published => "Published",
        }
    }

    /// Collection name used as the first part of a post id.
    pub fn collection(&self) -> &'static str {
        match self {
            PostStatus::Draft => "drafts",
            PostStatus::Published => "posts",
        }
    }
}

/// Outcome of the auto-commit that follows every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Disabled,
    MissingIdentity,
    Skipped,
    Committed,
}

impl CommitStatus {
    /// Toast announced after a save, if this outcome deserves one.
    pub fn toast(&self) -> Option<&'static str> {
        match self {
            CommitStatus::Committed => Some("Changes committed. Remember to push your branch."),
            CommitStatus::MissingIdentity => {
                Some("Auto-commit skipped. Set GIT_USER_NAME and GIT_USER_EMAIL.")
            }
            CommitStatus::Disabled | CommitStatus::Skipped => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of the post listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub status: PostStatus,
    pub title: String,
    /// ISO-8601 UTC timestamp
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: String,
}

/// A full post as loaded into the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub status: PostStatus,
    pub title: String,
    /// ISO-8601 UTC timestamp
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub body: String,
    pub author: String,
}

/// Tags as sent by a client: a list, or one comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    List(Vec<String>),
    Text(String),
}

impl Tags {
    /// Trimmed, non-empty tags in input order.
    pub fn to_list(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Tags::List(items) => items.iter().map(String::as_str).collect(),
            Tags::Text(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Body of a create or update request.
///
/// For updates, a field left as `None` keeps the stored value; `Some("")`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `YYYY-MM-DDTHH:MM` local time, or any parseable date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub publish: bool,
}

/// Response to a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id: String,
    pub status: PostStatus,
    #[serde(rename = "commitStatus")]
    pub commit_status: CommitStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
}

/// Response to a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: DeleteStatus,
    #[serde(rename = "commitStatus")]
    pub commit_status: CommitStatus,
}

impl DeleteResponse {
    pub fn new(commit_status: CommitStatus) -> Self {
        Self {
            status: DeleteStatus::Deleted,
            commit_status,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content API
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking post storage used by the editor session.
pub trait ContentApi {
    /// All posts and drafts, newest first.
    fn list_posts(&mut self) -> Result<Vec<PostSummary>>;

    /// Load one post. Invalid ids are errors.
    fn get_post(&mut self, id: &str) -> Result<Post>;

    fn create_post(&mut self, payload: &PostPayload) -> Result<SaveResponse>;

    /// Update a post; publishing a draft moves it and changes its id.
    fn update_post(&mut self, id: &str, payload: &PostPayload) -> Result<SaveResponse>;

    fn delete_post(&mut self, id: &str, commit: bool) -> Result<DeleteResponse>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

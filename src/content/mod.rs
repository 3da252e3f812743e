//! File-backed content repository
//!
//! Posts are markdown files with YAML front matter in a Jekyll-style tree:
//! `<root>/_posts/YYYY-MM-DD-slug.md` for published posts and
//! `<root>/_drafts/slug.md` for drafts. A post id is
//! `<collection>/<filename>`, where the collection is `posts` or `drafts`.
//! Every write is followed by a git auto-commit.

pub mod dates;
pub mod front_matter;
pub mod git;
pub mod text;

pub use front_matter::Document;
pub use git::{ChangedFile, GitCommitter, GitStatus};

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{
    CommitStatus, ContentApi, DeleteResponse, Post, PostPayload, PostStatus, PostSummary,
    SaveResponse,
};
use crate::config::Settings;
use crate::error::{Error, Result};

pub const POSTS_DIR: &str = "_posts";
pub const DRAFTS_DIR: &str = "_drafts";

const DEFAULT_TITLE: &str = "Untitled";

// ─────────────────────────────────────────────────────────────────────────────
// Post ids
// ─────────────────────────────────────────────────────────────────────────────

/// A validated post id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId {
    pub status: PostStatus,
    pub filename: String,
}

impl PostId {
    /// Validate `<collection>/<filename>.md`.
    pub fn parse(raw: &str) -> Result<Self> {
        let decoded = urlencoding::decode(raw)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        let parts: Vec<&str> = decoded.split('/').collect();
        let [collection, filename] = parts.as_slice() else {
            return Err(Error::invalid_id(raw, "Invalid post id."));
        };
        if collection.is_empty() || filename.is_empty() {
            return Err(Error::invalid_id(raw, "Invalid post id."));
        }
        if !filename.ends_with(".md") {
            return Err(Error::invalid_id(raw, "Only markdown posts are supported."));
        }
        if Path::new(filename).file_name().and_then(|n| n.to_str()) != Some(*filename)
            || filename.contains('\\')
        {
            return Err(Error::invalid_id(raw, "Invalid filename."));
        }

        let status = match *collection {
            "posts" => PostStatus::Published,
            "drafts" => PostStatus::Draft,
            _ => return Err(Error::invalid_id(raw, "Invalid collection.")),
        };

        Ok(Self {
            status,
            filename: filename.to_string(),
        })
    }

    pub fn new(status: PostStatus, filename: impl Into<String>) -> Self {
        Self {
            status,
            filename: filename.into(),
        }
    }

    /// Filename without the `.md` extension.
    pub fn stem(&self) -> &str {
        self.filename.strip_suffix(".md").unwrap_or(&self.filename)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.status.collection(), self.filename)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository
// ─────────────────────────────────────────────────────────────────────────────

/// Posts and drafts under a blog root, with git auto-commit.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    default_author: String,
    git: GitCommitter,
}

impl Repository {
    /// Open the repository configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::open(
            settings.repository_root(),
            &settings.repository.default_author,
            GitCommitter::new(settings.repository_root(), settings.git.clone()),
        )
    }

    /// Open a blog root. `_posts` must exist; `_drafts` is created.
    pub fn open(root: impl Into<PathBuf>, default_author: &str, git: GitCommitter) -> Result<Self> {
        let root = root.into();
        if !root.join(POSTS_DIR).is_dir() {
            return Err(Error::MissingRepository { root });
        }
        let drafts = root.join(DRAFTS_DIR);
        fs::create_dir_all(&drafts).map_err(|source| Error::FileWrite {
            path: drafts.clone(),
            source,
        })?;

        info!("Opened blog repository at {}", root.display());
        Ok(Self {
            root,
            default_author: default_author.trim().to_string(),
            git,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git(&self) -> &GitCommitter {
        &self.git
    }

    fn dir(&self, status: PostStatus) -> PathBuf {
        match status {
            PostStatus::Published => self.root.join(POSTS_DIR),
            PostStatus::Draft => self.root.join(DRAFTS_DIR),
        }
    }

    pub fn path_of(&self, id: &PostId) -> PathBuf {
        self.dir(id.status).join(&id.filename)
    }

    fn read_document(&self, path: &Path) -> Result<Document> {
        let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::PostNotFound {
                id: path.display().to_string(),
            },
            _ => Error::FileRead {
                path: path.to_path_buf(),
                source,
            },
        })?;
        front_matter::parse(&raw)
    }

    fn write_document(&self, path: &Path, body: &str, data: &Mapping) -> Result<()> {
        let markdown = front_matter::stringify(body, data)?;
        fs::write(path, markdown).map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Front matter date, else the file's modification time, as ISO.
    fn iso_date(&self, doc: &Document, path: &Path) -> Option<String> {
        if let Some(date) = dates::from_front_matter(doc.get("date")) {
            return Some(dates::to_iso(date));
        }
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(dates::system_time_to_iso)
            .ok()
    }

    fn summarize(&self, id: &PostId) -> Result<PostSummary> {
        let path = self.path_of(id);
        let doc = self.read_document(&path)?;
        Ok(PostSummary {
            id: id.to_string(),
            status: id.status,
            title: doc.get_str("title").unwrap_or_else(|| id.stem().to_string()),
            date: self.iso_date(&doc, &path),
            tags: text::normalize_tags(doc.get("tags")),
            excerpt: text::excerpt(&doc.body),
        })
    }

    fn list_collection(&self, status: PostStatus) -> Result<Vec<PostSummary>> {
        let dir = self.dir(status);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !filename.ends_with(".md") || !entry.path().is_file() {
                continue;
            }
            match self.summarize(&PostId::new(status, filename)) {
                Ok(summary) => summaries.push(summary),
                Err(err) => warn!("Skipping {}: {}", entry.path().display(), err),
            }
        }
        Ok(summaries)
    }

    /// First free `<base>.md`, `<base>-1.md`, ... in a collection.
    fn unique_filename(&self, status: PostStatus, base: &str) -> String {
        let dir = self.dir(status);
        let mut candidate = format!("{}.md", base);
        let mut counter = 1;
        while dir.join(&candidate).exists() {
            candidate = format!("{}-{}.md", base, counter);
            counter += 1;
        }
        candidate
    }

    fn base_name(status: PostStatus, title: &str, date: NaiveDateTime) -> String {
        let slug = text::slugify(title);
        match status {
            PostStatus::Published => format!("{}-{}", dates::format_filename(date), slug),
            PostStatus::Draft => slug,
        }
    }

    /// Merge the editable fields into existing front matter.
    fn assemble_front_matter(
        &self,
        existing: &Mapping,
        title: &str,
        date: NaiveDateTime,
        tags: &[String],
        status: PostStatus,
        publish: bool,
    ) -> Mapping {
        let mut data = existing.clone();
        data.insert("title".into(), title.into());
        data.insert("date".into(), dates::format_front_matter(date).into());

        if tags.is_empty() {
            data.remove("tags");
        } else {
            let list: Vec<Value> = tags.iter().map(|tag| tag.as_str().into()).collect();
            data.insert("tags".into(), Value::Sequence(list));
        }

        let has_author = data
            .get("author")
            .and_then(text::scalar_to_string)
            .is_some_and(|author| !author.is_empty());
        if !has_author && !self.default_author.is_empty() {
            data.insert("author".into(), self.default_author.as_str().into());
        }

        let had_published = existing.contains_key("published");
        match status {
            PostStatus::Draft if had_published || publish => {
                data.insert("published".into(), publish.into());
            }
            PostStatus::Published if had_published => {
                data.insert("published".into(), true.into());
            }
            _ => {}
        }

        data
    }

    /// Input date from a payload: form value, any parseable date, or none.
    fn payload_date(value: Option<&str>) -> Option<NaiveDateTime> {
        let value = value?;
        dates::parse_input_date(value).or_else(|| dates::parse_date_value(value))
    }
}

impl ContentApi for Repository {
    fn list_posts(&mut self) -> Result<Vec<PostSummary>> {
        let mut all = self.list_collection(PostStatus::Published)?;
        all.extend(self.list_collection(PostStatus::Draft)?);
        all.sort_by_key(|post| std::cmp::Reverse(dates::iso_timestamp(post.date.as_deref())));
        debug!("Listed {} posts", all.len());
        Ok(all)
    }

    fn get_post(&mut self, id: &str) -> Result<Post> {
        let id = PostId::parse(id)?;
        let path = self.path_of(&id);
        let doc = self.read_document(&path).map_err(|err| match err {
            Error::PostNotFound { .. } => Error::PostNotFound { id: id.to_string() },
            other => other,
        })?;

        Ok(Post {
            id: id.to_string(),
            status: id.status,
            title: doc.get_str("title").unwrap_or_default(),
            date: self.iso_date(&doc, &path),
            tags: text::normalize_tags(doc.get("tags")),
            author: doc
                .get_str("author")
                .unwrap_or_else(|| self.default_author.clone()),
            body: doc.body,
        })
    }

    fn create_post(&mut self, payload: &PostPayload) -> Result<SaveResponse> {
        let title = payload
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let body = payload.body.clone().unwrap_or_default();
        let date = Self::payload_date(payload.date.as_deref()).unwrap_or_else(dates::now);
        let tags = payload.tags.as_ref().map(|t| t.to_list()).unwrap_or_default();
        let status = if payload.publish {
            PostStatus::Published
        } else {
            PostStatus::Draft
        };

        let data =
            self.assemble_front_matter(&Mapping::new(), &title, date, &tags, status, payload.publish);
        let filename = self.unique_filename(status, &Self::base_name(status, &title, date));
        let id = PostId::new(status, filename);
        self.write_document(&self.path_of(&id), &body, &data)?;
        info!("Created {}", id);

        let action = if payload.publish { "Publish" } else { "Save draft" };
        let commit_status = self.git.commit_changes(action, &title)?;
        Ok(SaveResponse {
            id: id.to_string(),
            status,
            commit_status,
        })
    }

    fn update_post(&mut self, id: &str, payload: &PostPayload) -> Result<SaveResponse> {
        let id = PostId::parse(id)?;
        let path = self.path_of(&id);
        let doc = self.read_document(&path).map_err(|err| match err {
            Error::PostNotFound { .. } => Error::PostNotFound { id: id.to_string() },
            other => other,
        })?;

        let title = match &payload.title {
            Some(title) => title.trim().to_string(),
            None => doc.get_str("title").unwrap_or_default(),
        };
        let title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };
        let body = payload.body.clone().unwrap_or_else(|| doc.body.clone());
        let date = match &payload.date {
            Some(value) => Self::payload_date(Some(value)),
            None => dates::from_front_matter(doc.get("date")),
        }
        .unwrap_or_else(dates::now);
        let tags = match &payload.tags {
            Some(tags) => tags.to_list(),
            None => text::normalize_tags(doc.get("tags")),
        };

        let data =
            self.assemble_front_matter(&doc.data, &title, date, &tags, id.status, payload.publish);

        if id.status == PostStatus::Draft && payload.publish {
            let base = Self::base_name(PostStatus::Published, &title, date);
            let published = PostId::new(
                PostStatus::Published,
                self.unique_filename(PostStatus::Published, &base),
            );
            self.write_document(&self.path_of(&published), &body, &data)?;
            fs::remove_file(&path).map_err(|source| Error::FileWrite {
                path: path.clone(),
                source,
            })?;
            info!("Published {} as {}", id, published);

            let commit_status = self.git.commit_changes("Publish", &title)?;
            return Ok(SaveResponse {
                id: published.to_string(),
                status: PostStatus::Published,
                commit_status,
            });
        }

        self.write_document(&path, &body, &data)?;
        info!("Saved {}", id);
        let commit_status = self.git.commit_changes("Save draft", &title)?;
        Ok(SaveResponse {
            id: id.to_string(),
            status: id.status,
            commit_status,
        })
    }

    fn delete_post(&mut self, id: &str, commit: bool) -> Result<DeleteResponse> {
        let id = PostId::parse(id)?;
        let path = self.path_of(&id);

        let mut title = id.stem().to_string();
        if commit {
            let doc = self.read_document(&path)?;
            if let Some(stored) = doc.get_str("title") {
                title = stored;
            }
        }

        fs::remove_file(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::PostNotFound { id: id.to_string() },
            _ => Error::FileWrite {
                path: path.clone(),
                source,
            },
        })?;
        info!("Deleted {}", id);

        if !commit {
            return Ok(DeleteResponse::new(CommitStatus::Skipped));
        }
        let commit_status = self
            .git
            .commit_with_message(&format!("deleted {}", title))?;
        Ok(DeleteResponse::new(commit_status))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

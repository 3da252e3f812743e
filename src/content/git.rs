//! Git auto-commit
//!
//! Every write to the blog is followed by a commit of `_posts/` and
//! `_drafts/`. The `git` executable does the work; nothing here keeps
//! repository state between calls. Authors can also read the branch
//! status and commit by hand with their own message.

use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::api::CommitStatus;
use crate::config::GitSettings;
use crate::error::{Error, Result};

/// Directories whose changes are committed.
pub const TRACKED_DIRS: [&str; 2] = ["_posts", "_drafts"];

/// A changed path under the tracked directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: String,
    /// Two-letter index/worktree code (`M.`, `.M`, `A.`, `??`, ...)
    pub status: String,
}

/// Branch position and pending post changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    /// `None` on a detached HEAD
    pub branch: Option<String>,
    pub ahead: usize,
    pub behind: usize,
    pub files: Vec<ChangedFile>,
}

/// Commits post changes in a blog repository.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    root: PathBuf,
    settings: GitSettings,
}

impl GitCommitter {
    pub fn new(root: impl Into<PathBuf>, settings: GitSettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Commit pending post changes as `"<action>: <title>"`.
    pub fn commit_changes(&self, action: &str, title: &str) -> Result<CommitStatus> {
        let title = if title.is_empty() { "Untitled" } else { title };
        self.commit_with_message(&format!("{}: {}", action, title))
    }

    /// Commit pending post changes with an explicit message.
    pub fn commit_with_message(&self, message: &str) -> Result<CommitStatus> {
        if !self.settings.enabled {
            return Ok(CommitStatus::Disabled);
        }
        if !self.settings.has_identity() {
            debug!("Skipping commit, no git identity configured");
            return Ok(CommitStatus::MissingIdentity);
        }

        self.configure_identity()?;

        if self.changed_files()?.is_empty() {
            debug!("Nothing to commit under {:?}", TRACKED_DIRS);
            return Ok(CommitStatus::Skipped);
        }

        self.commit_all(message)?;
        Ok(CommitStatus::Committed)
    }

    /// Commit the tracked directories with a message typed by the author.
    ///
    /// Unlike auto-commit this reports failures: git disabled, an empty
    /// message, or nothing to commit (from `git commit` itself).
    pub fn commit(&self, message: &str) -> Result<CommitStatus> {
        if !self.settings.enabled {
            return Err(Error::GitDisabled);
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::EmptyCommitMessage);
        }
        if self.settings.has_identity() {
            self.configure_identity()?;
        }
        self.commit_all(message)?;
        Ok(CommitStatus::Committed)
    }

    /// Current branch, its distance from upstream, and changed post files.
    pub fn status(&self) -> Result<GitStatus> {
        if !self.settings.enabled {
            return Err(Error::GitDisabled);
        }
        self.read_status()
    }

    fn configure_identity(&self) -> Result<()> {
        self.run(&["config", "--local", "user.name", &self.settings.user_name])?;
        self.run(&["config", "--local", "user.email", &self.settings.user_email])?;
        Ok(())
    }

    /// Stage and commit everything under the tracked directories.
    ///
    /// Does not check identity or pending changes; `git commit` fails when
    /// there is nothing to commit.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        let mut add = vec!["add", "-A", "--"];
        // git rejects pathspecs that match nothing on disk
        add.extend(
            TRACKED_DIRS
                .iter()
                .filter(|dir| self.root.join(dir).exists()),
        );
        self.run(&add)?;
        self.run(&["commit", "-m", message])?;
        info!("Committed: {}", message);
        Ok(())
    }

    /// Paths under the tracked directories with uncommitted changes.
    pub fn changed_files(&self) -> Result<Vec<String>> {
        Ok(self
            .read_status()?
            .files
            .into_iter()
            .map(|file| file.path)
            .collect())
    }

    fn read_status(&self) -> Result<GitStatus> {
        let output = self.run(&[
            "status",
            "--porcelain=v2",
            "--branch",
            "--untracked-files=all",
        ])?;
        Ok(parse_status(&output))
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        debug!("Running git {}", command);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|err| Error::Git {
                command: command.clone(),
                message: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::Git { command, message });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Porcelain v2
// ─────────────────────────────────────────────────────────────────────────────

fn parse_status(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in output.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            status.branch = (head != "(detached)").then(|| head.to_string());
        } else if let Some(counts) = line.strip_prefix("# branch.ab ") {
            let mut parts = counts.split_whitespace();
            status.ahead = parse_count(parts.next(), '+');
            status.behind = parse_count(parts.next(), '-');
        } else if let Some(file) = parse_entry(line) {
            if is_tracked(&file.path) {
                status.files.push(file);
            }
        }
    }
    status
}

fn parse_count(part: Option<&str>, sign: char) -> usize {
    part.and_then(|p| p.strip_prefix(sign))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// One changed-path line. Field counts differ per entry kind; the path is
/// always last (renames append `<tab>original`).
fn parse_entry(line: &str) -> Option<ChangedFile> {
    let (kind, rest) = line.split_once(' ')?;
    let (status, path) = match kind {
        "?" => ("??", rest),
        "1" => {
            let fields: Vec<&str> = rest.splitn(8, ' ').collect();
            (*fields.first()?, *fields.get(7)?)
        }
        "2" => {
            let fields: Vec<&str> = rest.splitn(9, ' ').collect();
            let path = fields.get(8)?.split('\t').next()?;
            (*fields.first()?, path)
        }
        "u" => {
            let fields: Vec<&str> = rest.splitn(10, ' ').collect();
            (*fields.first()?, *fields.get(9)?)
        }
        _ => return None,
    };
    Some(ChangedFile {
        path: path.trim_matches('"').to_string(),
        status: status.to_string(),
    })
}

fn is_tracked(path: &str) -> bool {
    TRACKED_DIRS
        .iter()
        .any(|dir| path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/')))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Empty repository on branch `main` with a `_posts` directory.
    fn init_blog(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        fs::create_dir_all(dir.join("_posts")).unwrap();
        fs::create_dir_all(dir.join("_drafts")).unwrap();
    }

    fn identity() -> GitSettings {
        settings(true, "Test Author", "author@example.com")
    }

    fn settings(enabled: bool, name: &str, email: &str) -> GitSettings {
        GitSettings {
            enabled,
            user_name: name.to_string(),
            user_email: email.to_string(),
        }
    }

    #[test]
    fn test_disabled_never_runs_git() {
        let dir = TempDir::new().unwrap();
        let committer = GitCommitter::new(dir.path(), settings(false, "A", "a@x"));
        assert_eq!(
            committer.commit_changes("Publish", "T").unwrap(),
            CommitStatus::Disabled
        );
    }

    #[test]
    fn test_missing_identity() {
        let dir = TempDir::new().unwrap();
        let committer = GitCommitter::new(dir.path(), settings(true, "A", " "));
        assert_eq!(
            committer.commit_changes("Publish", "T").unwrap(),
            CommitStatus::MissingIdentity
        );
    }

    #[test]
    fn test_outside_repository_is_git_error() {
        let dir = TempDir::new().unwrap();
        let committer = GitCommitter::new(dir.path().join("missing"), settings(true, "A", "a@x"));
        assert!(matches!(
            committer.commit_changes("Publish", "T"),
            Err(Error::Git { .. })
        ));
    }

    #[test]
    fn test_commit_then_nothing_left_is_skipped() {
        let dir = TempDir::new().unwrap();
        init_blog(dir.path());
        fs::write(dir.path().join("_posts/2024-01-01-a.md"), "---\ntitle: A\n---\nbody\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a post").unwrap();
        let committer = GitCommitter::new(dir.path(), identity());

        assert_eq!(committer.changed_files().unwrap(), vec!["_posts/2024-01-01-a.md"]);
        assert_eq!(
            committer.commit_changes("Publish", "A").unwrap(),
            CommitStatus::Committed
        );
        assert_eq!(git(dir.path(), &["rev-list", "--count", "HEAD"]), "1");
        assert_eq!(git(dir.path(), &["log", "-1", "--format=%s"]), "Publish: A");
        assert_eq!(git(dir.path(), &["log", "-1", "--format=%an"]), "Test Author");

        assert_eq!(
            committer.commit_changes("Publish", "A").unwrap(),
            CommitStatus::Skipped
        );
        assert_eq!(git(dir.path(), &["rev-list", "--count", "HEAD"]), "1");
    }

    #[test]
    fn test_status_lists_post_changes_only() {
        let dir = TempDir::new().unwrap();
        init_blog(dir.path());
        fs::write(dir.path().join("_drafts/idea.md"), "draft").unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();
        let committer = GitCommitter::new(dir.path(), identity());

        let status = committer.status().unwrap();
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!((status.ahead, status.behind), (0, 0));
        assert_eq!(
            status.files,
            vec![ChangedFile {
                path: "_drafts/idea.md".to_string(),
                status: "??".to_string(),
            }]
        );
    }

    #[test]
    fn test_manual_commit() {
        let dir = TempDir::new().unwrap();
        init_blog(dir.path());
        fs::write(dir.path().join("_drafts/idea.md"), "draft").unwrap();
        let committer = GitCommitter::new(dir.path(), identity());

        assert!(matches!(committer.commit("  "), Err(Error::EmptyCommitMessage)));
        assert_eq!(committer.commit(" Weekly notes ").unwrap(), CommitStatus::Committed);
        assert_eq!(git(dir.path(), &["log", "-1", "--format=%s"]), "Weekly notes");

        // git itself refuses an empty commit
        assert!(matches!(committer.commit("Again"), Err(Error::Git { .. })));
    }

    #[test]
    fn test_status_and_manual_commit_need_git_enabled() {
        let dir = TempDir::new().unwrap();
        let committer = GitCommitter::new(dir.path(), settings(false, "A", "a@x"));
        assert!(matches!(committer.status(), Err(Error::GitDisabled)));
        assert!(matches!(committer.commit("msg"), Err(Error::GitDisabled)));
    }

    #[test]
    fn test_parse_porcelain_v2() {
        let output = "# branch.oid 1234\n\
# branch.head feature\n\
# branch.upstream origin/feature\n\
# branch.ab +2 -1\n\
1 .M N... 100644 100644 100644 aaa bbb _posts/2024-01-01-a.md\n\
2 R. N... 100644 100644 100644 aaa bbb R100 _posts/new name.md\t_drafts/old.md\n\
1 M. N... 100644 100644 100644 aaa bbb _config.yml\n\
? _drafts/untracked.md\n";
        let status = parse_status(output);
        assert_eq!(status.branch.as_deref(), Some("feature"));
        assert_eq!((status.ahead, status.behind), (2, 1));
        let files: Vec<(&str, &str)> = status
            .files
            .iter()
            .map(|f| (f.path.as_str(), f.status.as_str()))
            .collect();
        assert_eq!(
            files,
            [
                ("_posts/2024-01-01-a.md", ".M"),
                ("_posts/new name.md", "R."),
                ("_drafts/untracked.md", "??"),
            ]
        );
    }

    #[test]
    fn test_detached_head_has_no_branch() {
        let status = parse_status("# branch.oid abc\n# branch.head (detached)\n");
        assert_eq!(status.branch, None);
    }
}

//! Editor session controller
//!
//! [`EditorSession`] is the whole client state of the blog editor: which
//! view is showing, the post being edited, its metadata form and document
//! buffer, the link dialog, feedback messages and the toast. User actions
//! come in as method calls; storage goes out through a [`ContentApi`].
//!
//! Navigation follows the location hash. Setting a new hash runs the route
//! handler, except after a save, where the hash is only updated so the
//! session keeps its state.

mod form;
mod route;
mod shortcuts;
mod toast;

pub use form::{PostForm, Snapshot, UNTITLED};
pub use route::Route;
pub use shortcuts::{EditorAction, Key, KeyChord};
pub use toast::{Toast, ToastTicket};

use log::{debug, info, warn};
use std::path::PathBuf;

use crate::api::{ContentApi, PostStatus, PostSummary};
use crate::config::{save_config_to, EditorMode, Settings, Theme};
use crate::content::dates;
use crate::editor::{DocumentBuffer, LinkContext, LinkDialog};

// ─────────────────────────────────────────────────────────────────────────────
// Supporting types
// ─────────────────────────────────────────────────────────────────────────────

/// Asks the author to confirm a destructive step.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Editor,
}

/// Status line under the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub is_error: bool,
}

/// A post as shown in the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    /// `"<status> • <date>"`
    pub meta: String,
    pub excerpt: String,
    /// Route opened by clicking the title
    pub route: Route,
}

impl From<&PostSummary> for PostCard {
    fn from(post: &PostSummary) -> Self {
        let title = if post.title.is_empty() {
            UNTITLED.to_string()
        } else {
            post.title.clone()
        };
        let excerpt = if post.excerpt.is_empty() {
            "(No preview available)".to_string()
        } else {
            post.excerpt.clone()
        };
        Self {
            id: post.id.clone(),
            title,
            meta: format!(
                "{} • {}",
                post.status.label(),
                dates::display_date(post.date.as_deref())
            ),
            excerpt,
            route: Route::Edit(post.id.clone()),
        }
    }
}

fn post_count_message(count: usize) -> String {
    format!("{} post{}.", count, if count == 1 { "" } else { "s" })
}

// ─────────────────────────────────────────────────────────────────────────────
// EditorSession
// ─────────────────────────────────────────────────────────────────────────────

/// Client state of one editing session.
pub struct EditorSession<A: ContentApi> {
    api: A,
    settings: Settings,
    /// Where theme changes are saved; none keeps them in memory
    config_path: Option<PathBuf>,

    view: View,
    location: String,

    // List view
    posts: Vec<PostCard>,
    list_loaded: bool,
    list_feedback: String,

    // Editor view
    buffer: DocumentBuffer,
    form: PostForm,
    link_dialog: LinkDialog,
    editor_feedback: Option<Feedback>,
    current_post_id: Option<String>,
    current_status: Option<PostStatus>,
    is_new: bool,
    /// The post was created by this session from the "new" view
    created_from_new: bool,
    original: Option<Snapshot>,

    toast: Toast,
}

impl<A: ContentApi> EditorSession<A> {
    pub fn new(api: A, settings: Settings) -> Self {
        let buffer = DocumentBuffer::new(settings.default_mode);
        let toast = Toast::new(settings.toast_duration_ms);
        Self {
            api,
            settings,
            config_path: None,
            view: View::List,
            location: Route::List.to_hash(),
            posts: Vec::new(),
            list_loaded: false,
            list_feedback: String::new(),
            buffer,
            form: PostForm::default(),
            link_dialog: LinkDialog::new(),
            editor_feedback: None,
            current_post_id: None,
            current_status: None,
            is_new: false,
            created_from_new: false,
            original: None,
            toast,
        }
    }

    /// Save settings changes (the theme) to `path`.
    pub fn persist_settings_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Current location hash.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn posts(&self) -> &[PostCard] {
        &self.posts
    }

    /// Placeholder for a successfully loaded, empty list.
    pub fn empty_list_message(&self) -> Option<&'static str> {
        (self.list_loaded && self.posts.is_empty()).then_some("No posts found.")
    }

    pub fn list_feedback(&self) -> &str {
        &self.list_feedback
    }

    pub fn editor_feedback(&self) -> Option<&Feedback> {
        self.editor_feedback.as_ref()
    }

    pub fn buffer(&self) -> &DocumentBuffer {
        &self.buffer
    }

    /// The document buffer, for selection changes and direct edits.
    pub fn buffer_mut(&mut self) -> &mut DocumentBuffer {
        &mut self.buffer
    }

    pub fn form(&self) -> &PostForm {
        &self.form
    }

    pub fn link_dialog(&self) -> &LinkDialog {
        &self.link_dialog
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    pub fn current_post_id(&self) -> Option<&str> {
        self.current_post_id.as_deref()
    }

    pub fn current_status(&self) -> Option<PostStatus> {
        self.current_status
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Feedback
    // ─────────────────────────────────────────────────────────────────────────

    fn set_editor_feedback(&mut self, message: impl Into<String>, is_error: bool) {
        self.editor_feedback = Some(Feedback {
            message: message.into(),
            is_error,
        });
    }

    fn report_error(&mut self, err: crate::error::Error) {
        warn!("Content request failed: {}", err);
        self.set_editor_feedback(format!("Error: {}", err), true);
    }

    /// Show a toast; the caller expires it with the returned ticket.
    pub fn show_toast(&mut self, message: impl Into<String>) -> ToastTicket {
        self.toast.show(message)
    }

    pub fn expire_toast(&mut self, ticket: ToastTicket) -> bool {
        self.toast.expire(ticket)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// Show whatever the current location points at.
    pub fn start(&mut self) {
        self.handle_route();
    }

    /// Change the location hash. A different hash runs the route handler.
    pub fn navigate(&mut self, hash: &str) {
        if self.location == hash {
            return;
        }
        self.location = hash.to_string();
        self.handle_route();
    }

    /// Navigate unless that would abandon unsaved edits the author wants to
    /// keep. Returns whether navigation happened.
    pub fn request_navigation(&mut self, route: &Route, confirm: &mut dyn Confirm) -> bool {
        if !self.confirm_abandon_changes(confirm) {
            return false;
        }
        self.navigate(&route.to_hash());
        true
    }

    fn confirm_abandon_changes(&mut self, confirm: &mut dyn Confirm) -> bool {
        if self.view != View::Editor || !self.is_dirty() {
            return true;
        }
        confirm.confirm("Abandon your in-progress changes?")
    }

    fn handle_route(&mut self) {
        match Route::parse(&self.location) {
            Route::New => self.open_new_post(),
            Route::Edit(id) => self.open_existing_post(&id),
            Route::List => self.show_list_view(),
        }
    }

    fn reset_post_state(&mut self) {
        self.current_post_id = None;
        self.current_status = None;
        self.is_new = false;
        self.created_from_new = false;
        self.original = None;
        self.link_dialog.cancel();
    }

    fn show_list_view(&mut self) {
        self.view = View::List;
        self.editor_feedback = None;
        self.reset_post_state();
        self.buffer.reset_dirty();
        self.load_posts();
    }

    /// Reload the post list.
    pub fn load_posts(&mut self) {
        self.list_feedback = "Loading posts...".to_string();
        match self.api.list_posts() {
            Ok(posts) => {
                self.posts = posts.iter().map(PostCard::from).collect();
                self.list_loaded = true;
                self.list_feedback = post_count_message(self.posts.len());
            }
            Err(err) => {
                warn!("Loading posts failed: {}", err);
                self.list_feedback = format!("Error: {}", err);
            }
        }
    }

    fn fill_form(&mut self, form: PostForm, body: &str) {
        self.form = form;
        self.buffer.set_content(body);
        self.link_dialog.cancel();
    }

    fn open_new_post(&mut self) {
        self.reset_post_state();
        self.is_new = true;
        self.current_status = Some(PostStatus::Draft);
        self.fill_form(PostForm::blank(), "");
        self.buffer.reset_dirty();
        self.set_editor_feedback("New draft ready.", false);
        self.view = View::Editor;
    }

    fn open_existing_post(&mut self, id: &str) {
        self.set_editor_feedback("Loading post...", false);
        self.view = View::Editor;

        match self.api.get_post(id) {
            Ok(post) => {
                self.reset_post_state();
                self.current_post_id = Some(post.id.clone());
                self.current_status = Some(post.status);
                let snapshot = Snapshot {
                    form: PostForm::from_post(&post),
                    body: post.body,
                };
                self.fill_form(snapshot.form.clone(), &snapshot.body);
                self.original = Some(snapshot);
                self.buffer.reset_dirty();
                let message = match post.status {
                    PostStatus::Draft => "Draft loaded.",
                    PostStatus::Published => "Post loaded.",
                };
                self.set_editor_feedback(message, false);
            }
            Err(err) => self.report_error(err),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────

    /// Save the post as a draft, or publish it. Returns whether it saved.
    pub fn save_post(&mut self, publish: bool) -> bool {
        if self.view != View::Editor {
            return false;
        }
        if self.form.title.trim().is_empty() {
            self.form.title = UNTITLED.to_string();
        }
        let body = self.buffer.content();
        let payload = self.form.to_payload(body.clone(), publish);

        self.set_editor_feedback(if publish { "Publishing..." } else { "Saving draft..." }, false);

        let result = match self.current_post_id.clone() {
            Some(id) => self.api.update_post(&id, &payload),
            None => {
                let result = self.api.create_post(&payload);
                if result.is_ok() {
                    self.created_from_new = true;
                }
                result
            }
        };
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.report_error(err);
                return false;
            }
        };

        info!("Saved {} ({:?})", response.id, response.status);
        self.current_post_id = Some(response.id.clone());
        self.current_status = Some(response.status);
        self.is_new = false;
        self.original = Some(Snapshot {
            form: PostForm {
                title: payload.title.unwrap_or_default(),
                ..self.form.clone()
            },
            body,
        });

        // Only the hash changes; reloading would reset the session
        let hash = Route::Edit(response.id).to_hash();
        if self.location != hash {
            self.location = hash;
        }

        self.set_editor_feedback(
            match response.status {
                PostStatus::Draft => "Draft saved.",
                PostStatus::Published => "Post published.",
            },
            false,
        );
        if let Some(message) = response.commit_status.toast() {
            self.show_toast(message);
        }
        self.buffer.reset_dirty();
        true
    }

    /// Throw away unsaved work.
    ///
    /// A never-saved post just leaves. A draft this session created is
    /// deleted after confirmation. Anything else is reset to its last
    /// saved state.
    pub fn discard_changes(&mut self, confirm: &mut dyn Confirm) {
        if self.view != View::Editor {
            return;
        }
        if self.is_new && self.current_post_id.is_none() {
            self.navigate(&Route::List.to_hash());
            return;
        }

        if let (true, Some(PostStatus::Draft), Some(id)) = (
            self.created_from_new,
            self.current_status,
            self.current_post_id.clone(),
        ) {
            if !confirm.confirm("Discard this draft?") {
                return;
            }
            match self.api.delete_post(&id, true) {
                Ok(_) => {
                    info!("Discarded draft {}", id);
                    self.navigate(&Route::List.to_hash());
                }
                Err(err) => self.report_error(err),
            }
            return;
        }

        if let Some(snapshot) = self.original.clone() {
            self.fill_form(snapshot.form, &snapshot.body);
            self.buffer.reset_dirty();
            self.set_editor_feedback("Changes discarded.", false);
        }
    }

    /// Delete the open post after confirmation. Returns whether it was
    /// deleted.
    pub fn delete_post(&mut self, confirm: &mut dyn Confirm) -> bool {
        let Some(id) = self.current_post_id.clone() else {
            return false;
        };
        if !confirm.confirm("Delete this post?") {
            return false;
        }
        match self.api.delete_post(&id, true) {
            Ok(response) => {
                if let Some(message) = response.commit_status.toast() {
                    self.show_toast(message);
                }
                self.navigate(&Route::List.to_hash());
                true
            }
            Err(err) => {
                self.report_error(err);
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: &str) {
        self.form.title = title.to_string();
        self.buffer.mark_dirty();
    }

    pub fn set_date(&mut self, date: &str) {
        self.form.date = date.to_string();
        self.buffer.mark_dirty();
    }

    pub fn set_tags(&mut self, tags: &str) {
        self.form.tags = tags.to_string();
        self.buffer.mark_dirty();
    }

    /// Replace the markdown source, as typed in source mode.
    pub fn edit_source(&mut self, text: &str) {
        if self.buffer.mode() != EditorMode::Source {
            debug!("Ignoring source edit in visual mode");
            return;
        }
        self.buffer.replace_source(text.to_string());
    }

    pub fn toggle_mode(&mut self) -> EditorMode {
        let mode = self.buffer.toggle_mode();
        debug!("Editor switched to {} mode", mode.label());
        mode
    }

    /// Run a toolbar or keyboard action. Returns whether anything changed.
    pub fn run_action(&mut self, action: EditorAction) -> bool {
        if self.view != View::Editor {
            return false;
        }
        match action {
            EditorAction::Link => {
                self.open_link_dialog();
                true
            }
            EditorAction::Indent => self.buffer.adjust_indentation(false),
            EditorAction::Outdent => self.buffer.adjust_indentation(true),
            EditorAction::ClearFormatting => self.buffer.clear_formatting(),
            EditorAction::ToggleMode => {
                self.toggle_mode();
                true
            }
            EditorAction::SaveDraft => self.save_post(false),
            EditorAction::Publish => self.save_post(true),
            other => other
                .format_span()
                .is_some_and(|span| self.buffer.apply_format(&span)),
        }
    }

    /// Handle a key press in the editor. Returns the action it triggered,
    /// so the caller can suppress the key's default behavior.
    pub fn handle_key(&mut self, chord: &KeyChord) -> Option<EditorAction> {
        if self.view != View::Editor {
            return None;
        }
        let action = EditorAction::from_chord(chord)?;
        debug!("Keyboard shortcut: {:?}", action);
        self.run_action(action);
        Some(action)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link dialog
    // ─────────────────────────────────────────────────────────────────────────

    pub fn open_link_dialog(&mut self) -> &LinkContext {
        self.link_dialog.open(&self.buffer)
    }

    /// Apply the open link dialog. A rejected URL shows a toast and leaves
    /// the dialog open. Returns whether the document changed.
    pub fn submit_link(&mut self, url: &str, text: &str) -> bool {
        match self.link_dialog.submit(&mut self.buffer, url, text) {
            Ok(changed) => changed,
            Err(err) => {
                self.show_toast(err.to_string());
                false
            }
        }
    }

    pub fn cancel_link_dialog(&mut self) {
        self.link_dialog.cancel();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Theme
    // ─────────────────────────────────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    /// Switch between light and dark and persist the choice.
    pub fn toggle_theme(&mut self) -> Theme {
        self.settings.theme = self.settings.theme.toggle();
        if let Some(path) = &self.config_path {
            if let Err(err) = save_config_to(path, &self.settings) {
                warn!("Failed to save theme: {}", err);
            }
        }
        self.settings.theme
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DeleteResponse, Post, PostPayload, SaveResponse};
    use crate::config::{load_config_from, GitSettings};
    use crate::content::{GitCommitter, Repository, POSTS_DIR};
    use crate::error::{Error, Result};
    use std::fs;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir, mode: EditorMode) -> EditorSession<Repository> {
        fs::create_dir_all(dir.path().join(POSTS_DIR)).unwrap();
        let git = GitCommitter::new(
            dir.path(),
            GitSettings {
                enabled: false,
                ..GitSettings::default()
            },
        );
        let repo = Repository::open(dir.path(), "", git).unwrap();
        let settings = Settings {
            default_mode: mode,
            ..Settings::default()
        };
        let mut session = EditorSession::new(repo, settings);
        session.start();
        session
    }

    fn yes(_: &str) -> bool {
        true
    }

    /// Content API whose every call fails.
    struct OfflineApi;

    impl ContentApi for OfflineApi {
        fn list_posts(&mut self) -> Result<Vec<PostSummary>> {
            Err(Error::Application("Request failed.".to_string()))
        }
        fn get_post(&mut self, _id: &str) -> Result<Post> {
            Err(Error::Application("Request failed.".to_string()))
        }
        fn create_post(&mut self, _payload: &PostPayload) -> Result<SaveResponse> {
            Err(Error::Application("Request failed.".to_string()))
        }
        fn update_post(&mut self, _id: &str, _payload: &PostPayload) -> Result<SaveResponse> {
            Err(Error::Application("Request failed.".to_string()))
        }
        fn delete_post(&mut self, _id: &str, _commit: bool) -> Result<DeleteResponse> {
            Err(Error::Application("Request failed.".to_string()))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // List view
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_start_loads_empty_list() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, EditorMode::Visual);
        assert_eq!(session.view(), View::List);
        assert_eq!(session.list_feedback(), "0 posts.");
        assert_eq!(session.empty_list_message(), Some("No posts found."));
    }

    #[test]
    fn test_list_cards() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_posts")).unwrap();
        fs::write(
            dir.path().join("_posts/2024-01-01-hi.md"),
            "---\ntitle: Hi\ndate: 2024-01-01 09:00:00\n---\n```\nonly code\n```\n",
        )
        .unwrap();
        let session = session_in(&dir, EditorMode::Visual);

        assert_eq!(session.list_feedback(), "1 post.");
        let card = &session.posts()[0];
        assert_eq!(card.title, "Hi");
        assert_eq!(card.meta, "Published • 2024-01-01 09:00");
        assert_eq!(card.excerpt, "(No preview available)");
        assert_eq!(card.route.to_hash(), "#/edit/posts%2F2024-01-01-hi.md");
    }

    #[test]
    fn test_api_failure_is_reported_inline() {
        let mut session = EditorSession::new(OfflineApi, Settings::default());
        session.start();
        assert_eq!(session.list_feedback(), "Error: Request failed.");
        assert_eq!(session.empty_list_message(), None);

        session.navigate("#/edit/drafts%2Fa.md");
        assert_eq!(session.view(), View::Editor);
        let feedback = session.editor_feedback().unwrap();
        assert_eq!(feedback.message, "Error: Request failed.");
        assert!(feedback.is_error);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Save and publish
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_new_draft_then_publish_updates_location() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);

        session.navigate("#/new");
        assert_eq!(session.editor_feedback().unwrap().message, "New draft ready.");
        session.set_title("Draft A");
        session.edit_source("Hello **world**");
        assert!(session.is_dirty());

        assert!(session.save_post(false));
        assert_eq!(session.current_status(), Some(PostStatus::Draft));
        assert_eq!(session.current_post_id(), Some("drafts/draft-a.md"));
        assert_eq!(session.location(), "#/edit/drafts%2Fdraft-a.md");
        assert_eq!(session.editor_feedback().unwrap().message, "Draft saved.");
        assert!(!session.is_dirty());

        assert!(session.save_post(true));
        assert_eq!(session.current_status(), Some(PostStatus::Published));
        let id = session.current_post_id().unwrap().to_string();
        assert!(id.starts_with("posts/") && id.ends_with("-draft-a.md"), "{}", id);
        assert_eq!(session.location(), Route::Edit(id.clone()).to_hash());
        assert_eq!(session.editor_feedback().unwrap().message, "Post published.");
        assert!(!dir.path().join("_drafts/draft-a.md").exists());

        let post = session.api_mut().get_post(&id).unwrap();
        assert_eq!(post.body, "Hello **world**\n");
    }

    #[test]
    fn test_blank_title_saved_as_untitled() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Visual);
        session.navigate("#/new");
        assert!(session.save_post(false));
        assert_eq!(session.form().title, UNTITLED);
        assert_eq!(session.current_post_id(), Some("drafts/untitled.md"));
    }

    #[test]
    fn test_ctrl_s_saves_draft() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.set_title("Keys");
        assert_eq!(
            session.handle_key(&KeyChord::ctrl('s')),
            Some(EditorAction::SaveDraft)
        );
        assert_eq!(session.current_post_id(), Some("drafts/keys.md"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Discard and abandon
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_discard_unsaved_new_post_returns_to_list() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Visual);
        session.navigate("#/new");
        session.discard_changes(&mut |_: &str| -> bool { panic!("no confirmation expected") });
        assert_eq!(session.view(), View::List);
        assert_eq!(session.location(), "#/");
    }

    #[test]
    fn test_discard_created_draft_asks_then_deletes() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.set_title("Scratch");
        assert!(session.save_post(false));

        let mut asked = Vec::new();
        session.discard_changes(&mut |message: &str| {
            asked.push(message.to_string());
            false
        });
        assert_eq!(asked, vec!["Discard this draft?"]);
        assert!(dir.path().join("_drafts/scratch.md").exists());

        session.discard_changes(&mut yes);
        assert!(!dir.path().join("_drafts/scratch.md").exists());
        assert_eq!(session.view(), View::List);
    }

    #[test]
    fn test_discard_existing_post_restores_saved_state() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_drafts")).unwrap();
        fs::write(
            dir.path().join("_drafts/kept.md"),
            "---\ntitle: Kept\ntags:\n  - a\n---\nOriginal body\n",
        )
        .unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/edit/drafts%2Fkept.md");
        assert_eq!(session.editor_feedback().unwrap().message, "Draft loaded.");
        assert_eq!(session.form().tags, "a");

        session.set_title("Changed");
        session.edit_source("Changed body");
        session.discard_changes(&mut |_: &str| -> bool { panic!("no confirmation expected") });

        assert_eq!(session.form().title, "Kept");
        assert_eq!(session.buffer().source(), "Original body\n");
        assert!(!session.is_dirty());
        assert_eq!(session.editor_feedback().unwrap().message, "Changes discarded.");
        assert!(dir.path().join("_drafts/kept.md").exists());
    }

    #[test]
    fn test_leaving_dirty_editor_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.set_tags("x");

        assert!(!session.request_navigation(&Route::List, &mut |_: &str| false));
        assert_eq!(session.view(), View::Editor);

        assert!(session.request_navigation(&Route::List, &mut yes));
        assert_eq!(session.view(), View::List);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_delete_post_confirms_first() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.set_title("Gone");
        session.save_post(true);
        let id = session.current_post_id().unwrap().to_string();

        assert!(!session.delete_post(&mut |_: &str| false));
        assert!(session.delete_post(&mut yes));
        assert_eq!(session.view(), View::List);
        assert!(session.api_mut().get_post(&id).is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_toolbar_formats_source_selection() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.edit_source("make bold");
        session.buffer_mut().set_source_selection(5, 9);

        assert!(session.run_action(EditorAction::Bold));
        assert_eq!(session.buffer().source(), "make **bold**");
        assert_eq!(session.handle_key(&KeyChord::ctrl('b')), Some(EditorAction::Bold));
        assert_eq!(session.buffer().source(), "make bold");
    }

    #[test]
    fn test_actions_ignored_in_list_view() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        assert!(!session.run_action(EditorAction::Bold));
        assert_eq!(session.handle_key(&KeyChord::ctrl('b')), None);
    }

    #[test]
    fn test_unsafe_link_shows_toast_and_keeps_dialog() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.edit_source("click here");
        session.buffer_mut().set_source_selection(6, 10);

        session.run_action(EditorAction::Link);
        assert!(session.link_dialog().is_open());
        assert!(!session.submit_link(" JaVaScRiPt:alert(1)", ""));
        assert_eq!(session.toast().message(), Some("That link is not allowed."));
        assert!(session.link_dialog().is_open());

        assert!(session.submit_link("http://x.com", ""));
        assert!(!session.link_dialog().is_open());
        assert!(session
            .buffer()
            .source()
            .starts_with("click [here](http://x.com){:"));
    }

    #[test]
    fn test_toggle_mode_twice_keeps_source() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir, EditorMode::Source);
        session.navigate("#/new");
        session.edit_source("Some *text* here\n");
        assert_eq!(session.handle_key(&KeyChord::ctrl('e')), Some(EditorAction::ToggleMode));
        assert_eq!(session.buffer().mode(), EditorMode::Visual);
        session.toggle_mode();
        assert_eq!(session.buffer().source(), "Some *text* here\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Theme
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_theme_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        let mut session = session_in(&dir, EditorMode::Visual).persist_settings_to(&config);

        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(load_config_from(&config).unwrap().theme, Theme::Dark);
        assert_eq!(session.toggle_theme(), Theme::Light);
        assert_eq!(load_config_from(&config).unwrap().theme, Theme::Light);
    }
}

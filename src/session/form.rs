//! Post metadata form: title, date and tags as the author types them.

use crate::api::{Post, PostPayload, Tags};
use crate::content::dates;

/// Title used when the author leaves it blank.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    /// `YYYY-MM-DDTHH:MM`, local time
    pub date: String,
    /// Comma-separated
    pub tags: String,
}

impl PostForm {
    /// An empty form dated now.
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            date: dates::input_value(dates::now()),
            tags: String::new(),
        }
    }

    /// Form values for a loaded post. A missing or bad date becomes now.
    pub fn from_post(post: &Post) -> Self {
        let date = post
            .date
            .as_deref()
            .map(dates::input_value_from_iso)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| dates::input_value(dates::now()));
        Self {
            title: post.title.clone(),
            date,
            tags: post.tags.join(", "),
        }
    }

    /// Request body for a save. A blank title is saved as [`UNTITLED`].
    pub fn to_payload(&self, body: String, publish: bool) -> PostPayload {
        let title = self.title.trim();
        PostPayload {
            title: Some(if title.is_empty() { UNTITLED } else { title }.to_string()),
            date: Some(self.date.clone()),
            tags: Some(Tags::Text(self.tags.clone())),
            body: Some(body),
            publish,
        }
    }
}

/// Last saved or loaded state, restored by "discard changes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub form: PostForm,
    pub body: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PostStatus;

    #[test]
    fn test_from_post_joins_tags_and_localizes_date() {
        let date = dates::parse_input_date("2024-05-06T07:08").unwrap();
        let post = Post {
            id: "drafts/a.md".to_string(),
            status: PostStatus::Draft,
            title: "A".to_string(),
            date: Some(dates::to_iso(date)),
            tags: vec!["x".to_string(), "y".to_string()],
            body: String::new(),
            author: String::new(),
        };
        let form = PostForm::from_post(&post);
        assert_eq!(form.tags, "x, y");
        assert_eq!(form.date, "2024-05-06T07:08");
    }

    #[test]
    fn test_blank_title_saves_as_untitled() {
        let form = PostForm {
            title: "   ".to_string(),
            ..PostForm::blank()
        };
        let payload = form.to_payload("Body".to_string(), true);
        assert_eq!(payload.title.as_deref(), Some(UNTITLED));
        assert_eq!(payload.body.as_deref(), Some("Body"));
        assert!(payload.publish);
    }
}

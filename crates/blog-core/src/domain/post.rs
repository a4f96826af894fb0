use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use super::{Comment, Tag, not_blank};
use crate::error::DomainError;
use crate::slug::slugify;

/// Minimum number of characters in a post body.
pub const MIN_CONTENT_LENGTH: usize = 10;
/// Maximum number of tags a post may carry.
pub const MAX_TAGS: usize = 4;

/// Post entity - a blog post together with its comments and tags.
///
/// Comments are kept newest first, tags alphabetically. Both collections are
/// only changed through the `add_*` / `remove_*` helpers so ordering and
/// uniqueness hold at all times.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Post {
    id: Option<i32>,
    #[validate(custom(function = "not_blank", message = "post.blank_title"))]
    pub title: String,
    /// Empty when the title has no letters or digits to derive one from.
    #[validate(custom(function = "not_blank", message = "post.blank_slug"))]
    pub slug: String,
    #[validate(
        custom(function = "not_blank", message = "post.blank_summary"),
        length(max = 255, message = "post.summary_too_long")
    )]
    pub summary: String,
    #[validate(
        custom(function = "not_blank", message = "post.blank_content"),
        length(min = 10, message = "post.too_short_content")
    )]
    content: String,
    pub published_at: DateTime<Utc>,
    pub author_id: i32,
    comments: Vec<Comment>,
    #[validate(length(max = 4, message = "post.too_many_tags"))]
    tags: Vec<Tag>,
}

/// Raw field values of a stored post, used by repositories to rebuild the
/// aggregate without going through the content setter.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub author_id: i32,
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        let mut post = Self {
            id: Some(record.id),
            title: record.title,
            slug: record.slug,
            summary: record.summary,
            content: record.content,
            published_at: record.published_at,
            author_id: record.author_id,
            comments: record.comments,
            tags: record.tags,
        };
        post.sort_comments();
        post.sort_tags();
        post
    }
}

impl Post {
    /// Create a new, not yet persisted post. The slug is derived from the title.
    pub fn new(
        author_id: i32,
        title: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let mut post = Self {
            id: None,
            slug: slugify(&title),
            title,
            summary: summary.into(),
            content: String::new(),
            published_at: Utc::now(),
            author_id,
            comments: Vec::new(),
            tags: Vec::new(),
        };
        post.set_content(content)?;
        Ok(post)
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    /// Record the storage-generated id. Attached comments follow along.
    pub fn assign_id(&mut self, id: i32) {
        self.id = Some(id);
        for comment in &mut self.comments {
            comment.post_id = Some(id);
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_authored_by(&self, user_id: i32) -> bool {
        self.author_id == user_id
    }

    /// Fails with `Forbidden` unless `user_id` wrote the post.
    pub fn ensure_authored_by(&self, user_id: i32) -> Result<(), DomainError> {
        if self.is_authored_by(user_id) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "only the author may change this post".to_string(),
            ))
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.slug = slugify(&self.title);
    }

    /// Replace the body, rejecting anything shorter than [`MIN_CONTENT_LENGTH`].
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        let content = content.into();
        if content.chars().count() < MIN_CONTENT_LENGTH {
            return Err(DomainError::validation("post.too_short_content"));
        }
        self.content = content;
        Ok(())
    }

    pub fn add_comment(&mut self, mut comment: Comment) {
        comment.post_id = self.id;
        if !self.comments.contains(&comment) {
            self.comments.push(comment);
            self.sort_comments();
        }
    }

    pub fn remove_comment(&mut self, comment: &Comment) {
        self.comments.retain(|c| c != comment);
    }

    /// Detach the comment with the given id, returning it if it was present.
    pub fn take_comment(&mut self, comment_id: i32) -> Option<Comment> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == Some(comment_id))?;
        Some(self.comments.remove(pos))
    }

    /// Detach a stored comment on behalf of `user_id`, who must have written
    /// either the comment or the post.
    pub fn remove_comment_by(
        &mut self,
        comment_id: i32,
        user_id: i32,
    ) -> Result<Comment, DomainError> {
        let author_id = self
            .comments
            .iter()
            .find(|c| c.id == Some(comment_id))
            .map(|c| c.author_id)
            .ok_or(DomainError::NotFound {
                entity_type: "comment",
                id: comment_id,
            })?;
        if author_id != user_id && !self.is_authored_by(user_id) {
            return Err(DomainError::Forbidden(
                "only the comment or post author may remove this comment".to_string(),
            ));
        }
        self.take_comment(comment_id).ok_or(DomainError::NotFound {
            entity_type: "comment",
            id: comment_id,
        })
    }

    /// Add tags, skipping any whose name is already attached.
    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = Tag>) {
        for tag in tags {
            if !self.tags.iter().any(|t| t.name == tag.name) {
                self.tags.push(tag);
            }
        }
        self.sort_tags();
    }

    pub fn remove_tag(&mut self, tag: &Tag) {
        self.tags.retain(|t| t.name != tag.name);
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// Evaluate every declarative constraint on the post and its comments.
    pub fn check(&self) -> Result<(), DomainError> {
        Validate::validate(self)?;
        for comment in &self.comments {
            comment.check()?;
        }
        Ok(())
    }

    fn sort_comments(&mut self) {
        self.comments
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    fn sort_tags(&mut self) {
        self.tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn sample() -> Post {
        Post::new(
            7,
            "Hello World",
            "A short summary",
            "Some long enough content",
        )
        .unwrap()
    }

    fn keys(err: DomainError) -> Vec<String> {
        match err {
            DomainError::Validation(keys) => keys,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_post_defaults() {
        let before = Utc::now();
        let post = sample();

        assert!(post.id().is_none());
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.author_id, 7);
        assert!(post.comments().is_empty());
        assert!(post.tags().is_empty());
        assert!(post.published_at >= before);
        assert!(post.check().is_ok());
    }

    #[test]
    fn test_content_setter_rejects_short_content() {
        let err = Post::new(1, "Title", "Summary", "too short").unwrap_err();
        assert_eq!(keys(err), vec!["post.too_short_content"]);

        let mut post = sample();
        assert!(post.set_content("tiny").is_err());
        assert_eq!(post.content(), "Some long enough content");
        assert!(post.set_content("exactly 10").is_ok());
    }

    #[test]
    fn test_set_title_updates_slug() {
        let mut post = sample();
        post.set_title("Une Journée à Paris");
        assert_eq!(post.slug, "une-journee-a-paris");
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        let mut post = sample();
        post.title = "   ".to_string();
        post.summary = String::new();
        assert_eq!(
            keys(post.check().unwrap_err()),
            vec!["post.blank_summary", "post.blank_title"]
        );
    }

    #[test]
    fn test_summary_length_limit() {
        let mut post = sample();
        post.summary = "é".repeat(255);
        assert!(post.check().is_ok());
        post.summary.push('x');
        assert_eq!(keys(post.check().unwrap_err()), vec!["post.summary_too_long"]);
    }

    #[test]
    fn test_tags_are_unique_sorted_and_capped() {
        let mut post = sample();
        post.add_tags(Tag::parse_list("web, rust, web"));
        post.add_tags(vec![Tag::new("rust"), Tag::new("async")]);

        let names: Vec<&str> = post.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["async", "rust", "web"]);
        assert!(post.check().is_ok());

        post.add_tags(vec![Tag::new("db"), Tag::new("http")]);
        assert_eq!(post.tags().len(), 5);
        assert_eq!(keys(post.check().unwrap_err()), vec!["post.too_many_tags"]);

        post.remove_tag(&Tag::new("http"));
        assert!(post.check().is_ok());
    }

    #[test]
    fn test_add_comment_links_and_orders() {
        let mut post = sample();
        post.assign_id(3);

        let mut older = Comment::new(1, "First comment");
        older.published_at = Utc::now() - TimeDelta::hours(1);
        let newer = Comment::new(2, "Second comment");

        post.add_comment(older.clone());
        post.add_comment(newer.clone());
        post.add_comment(newer.clone());

        assert_eq!(post.comments().len(), 2);
        assert_eq!(post.comments()[0].content, "Second comment");
        assert!(post.comments().iter().all(|c| c.post_id == Some(3)));

        let mut attached = older;
        attached.post_id = Some(3);
        post.remove_comment(&attached);
        assert_eq!(post.comments().len(), 1);
    }

    #[test]
    fn test_take_comment_by_id() {
        let mut post = sample();
        let mut comment = Comment::new(1, "Stored comment");
        comment.id = Some(11);
        post.add_comment(comment);

        assert!(post.take_comment(12).is_none());
        assert_eq!(post.take_comment(11).map(|c| c.author_id), Some(1));
        assert!(post.comments().is_empty());
    }

    #[test]
    fn test_remove_comment_by_checks_authorship() {
        let mut post = sample();
        let mut comment = Comment::new(1, "Stored comment");
        comment.id = Some(11);
        post.add_comment(comment);

        assert!(matches!(
            post.remove_comment_by(11, 99),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            post.remove_comment_by(12, 1),
            Err(DomainError::NotFound { entity_type: "comment", id: 12 })
        ));
        assert_eq!(post.comments().len(), 1);

        // The post's author (7) may remove anyone's comment.
        assert_eq!(post.remove_comment_by(11, 7).unwrap().author_id, 1);
        assert!(post.comments().is_empty());
    }

    #[test]
    fn test_only_author_may_edit() {
        let post = sample();
        assert!(post.ensure_authored_by(7).is_ok());
        assert!(matches!(post.ensure_authored_by(8), Err(DomainError::Forbidden(_))));
    }

    #[test]
    fn test_title_without_slug_characters_is_rejected() {
        let mut post = sample();
        post.set_title("!!!");
        assert_eq!(post.slug, "");
        assert_eq!(keys(post.check().unwrap_err()), vec!["post.blank_slug"]);
    }

    #[test]
    fn test_invalid_comment_fails_post_check() {
        let mut post = sample();
        post.add_comment(Comment::new(1, "no"));
        assert_eq!(keys(post.check().unwrap_err()), vec!["comment.invalid_length"]);
    }

    #[test]
    fn test_record_hydration_sorts_collections() {
        let record = PostRecord {
            id: 5,
            title: "Stored".into(),
            slug: "stored".into(),
            summary: "Summary".into(),
            content: "Stored content body".into(),
            published_at: Utc::now(),
            author_id: 1,
            comments: vec![],
            tags: vec![Tag::new("b"), Tag::new("a")],
        };
        let post = Post::from(record);
        assert_eq!(post.id(), Some(5));
        assert_eq!(post.tags()[0].name, "a");
    }

    #[test]
    fn test_serializes_content() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["content"], "Some long enough content");
        assert_eq!(json["slug"], "hello-world");
    }
}

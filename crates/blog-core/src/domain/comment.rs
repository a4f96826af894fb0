use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;
use crate::error::DomainError;

/// Comment entity - owned by a single post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Comment {
    pub id: Option<i32>,
    /// Set when the comment is attached through `Post::add_comment`.
    pub post_id: Option<i32>,
    pub author_id: i32,
    #[validate(
        custom(function = "not_blank", message = "comment.blank"),
        length(min = 5, max = 10000, message = "comment.invalid_length")
    )]
    pub content: String,
    pub published_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: i32, content: impl Into<String>) -> Self {
        Self {
            id: None,
            post_id: None,
            author_id,
            content: content.into(),
            published_at: Utc::now(),
        }
    }

    pub fn check(&self) -> Result<(), DomainError> {
        Validate::validate(self).map_err(Into::into)
    }
}

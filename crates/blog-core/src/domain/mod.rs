//! Domain entities - the core business objects.

mod comment;
mod page;
mod post;
mod tag;
mod user;

use validator::ValidationError;

pub use comment::Comment;
pub use page::{PAGE_SIZE, Page, page_offset};
pub use post::{MAX_TAGS, MIN_CONTENT_LENGTH, Post, PostRecord};
pub use tag::Tag;
pub use user::User;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

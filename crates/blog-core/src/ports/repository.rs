use async_trait::async_trait;

use crate::domain::{Page, Post, Tag, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i32> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository. Every method returns whole aggregates (comments and tags loaded).
///
/// `save` validates the post, enforces slug uniqueness, persists new tags,
/// rewrites tag links and drops comments no longer attached to the post.
/// `delete` removes the post's comments and tag links with it.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i32> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Published posts, newest first, optionally restricted to a tag name.
    async fn find_latest(&self, page: u64, tag: Option<&str>) -> Result<Page<Post>, RepoError>;

    /// Posts whose title contains any search term, newest first.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags ordered by name.
    async fn find_all(&self) -> Result<Vec<Tag>, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError>;
}

/// Split a search query into distinct terms of at least two characters.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.split_whitespace() {
        if term.chars().count() >= 2 && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

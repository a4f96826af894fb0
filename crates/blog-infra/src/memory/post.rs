use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use blog_core::domain::{Comment, PAGE_SIZE, Page, Post, Tag, page_offset};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, TagRepository, search_terms};

#[derive(Default)]
struct State {
    posts: BTreeMap<i32, Post>,
    /// Tag name -> id. Tags outlive the posts that introduced them.
    tags: BTreeMap<String, i32>,
    next_post_id: i32,
    next_comment_id: i32,
    next_tag_id: i32,
}

impl State {
    fn tag_id(&mut self, name: &str) -> i32 {
        if let Some(id) = self.tags.get(name) {
            return *id;
        }
        self.next_tag_id += 1;
        self.tags.insert(name.to_string(), self.next_tag_id);
        self.next_tag_id
    }
}

/// Post and tag storage sharing one lock, mirroring the post/tag tables.
#[derive(Default)]
pub struct InMemoryPostRepository {
    state: RwLock<State>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

#[async_trait]
impl BaseRepository<Post, i32> for InMemoryPostRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        post.check()?;

        let mut state = self.state.write().await;

        let slug_taken = state
            .posts
            .values()
            .any(|p| p.slug == post.slug && p.id() != post.id());
        if slug_taken {
            return Err(RepoError::Constraint("post.slug_unique".to_string()));
        }

        let id = match post.id() {
            Some(id) if state.posts.contains_key(&id) => id,
            Some(_) => return Err(RepoError::NotFound),
            None => {
                state.next_post_id += 1;
                state.next_post_id
            }
        };
        post.assign_id(id);

        let tags: Vec<Tag> = post
            .tags()
            .iter()
            .map(|t| Tag {
                id: Some(state.tag_id(&t.name)),
                name: t.name.clone(),
            })
            .collect();
        post.clear_tags();
        post.add_tags(tags);

        let unsaved: Vec<Comment> = post
            .comments()
            .iter()
            .filter(|c| c.id.is_none())
            .cloned()
            .collect();
        for mut comment in unsaved {
            post.remove_comment(&comment);
            state.next_comment_id += 1;
            comment.id = Some(state.next_comment_id);
            post.add_comment(comment);
        }

        // Replacing the stored aggregate drops comments the post no longer holds.
        state.posts.insert(id, post.clone());
        tracing::debug!(post_id = id, slug = %post.slug, "Post saved in memory");
        Ok(post)
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        match self.state.write().await.posts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn find_latest(&self, page: u64, tag: Option<&str>) -> Result<Page<Post>, RepoError> {
        let page = page.max(1);
        let now = Utc::now();
        let state = self.state.read().await;

        let mut matching: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.published_at <= now)
            .filter(|p| tag.is_none_or(|name| p.tags().iter().any(|t| t.name == name)))
            .cloned()
            .collect();
        newest_first(&mut matching);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page_offset(page, PAGE_SIZE)).unwrap_or(usize::MAX))
            .take(PAGE_SIZE as usize)
            .collect();
        Ok(Page::new(items, page, PAGE_SIZE, total))
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let state = self.state.read().await;
        let mut found: Vec<Post> = state
            .posts
            .values()
            .filter(|p| terms.iter().any(|term| p.title.contains(term.as_str())))
            .cloned()
            .collect();
        newest_first(&mut found);
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl TagRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Tag>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .tags
            .iter()
            .map(|(name, id)| Tag {
                id: Some(*id),
                name: name.clone(),
            })
            .collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let state = self.state.read().await;
        Ok(state.tags.get(name).map(|id| Tag {
            id: Some(*id),
            name: name.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn post(title: &str) -> Post {
        Post::new(1, title, "A summary", "Body text that is long enough").unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_ids_and_tags() {
        let repo = InMemoryPostRepository::new();
        let mut draft = post("First Post");
        draft.add_tags(Tag::parse_list("rust, web"));
        draft.add_comment(Comment::new(2, "Nice one!"));

        let saved = repo.save(draft).await.unwrap();

        assert_eq!(saved.id(), Some(1));
        assert!(saved.tags().iter().all(|t| t.id.is_some()));
        assert_eq!(saved.comments()[0].id, Some(1));
        assert_eq!(saved.comments()[0].post_id, Some(1));

        let names: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = InMemoryPostRepository::new();
        repo.save(post("Same Title")).await.unwrap();

        let err = repo.save(post("Same  title!")).await.unwrap_err();
        assert!(matches!(err, RepoError::Constraint(msg) if msg == "post.slug_unique"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_slug() {
        let repo = InMemoryPostRepository::new();
        let mut saved = repo.save(post("Stable Title")).await.unwrap();
        saved.summary = "Changed summary".to_string();

        let updated = repo.save(saved).await.unwrap();
        assert_eq!(updated.summary, "Changed summary");
        assert_eq!(updated.slug, "stable-title");
    }

    #[tokio::test]
    async fn test_too_many_tags_rejected() {
        let repo = InMemoryPostRepository::new();
        let mut draft = post("Tagged");
        draft.add_tags(Tag::parse_list("a, b, c, d, e"));

        let err = repo.save(draft).await.unwrap_err();
        assert!(matches!(err, RepoError::Invalid(_)));
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_removed_comment_is_dropped_on_save() {
        let repo = InMemoryPostRepository::new();
        let mut draft = post("Commented");
        draft.add_comment(Comment::new(2, "First comment"));
        let mut saved = repo.save(draft).await.unwrap();

        let comment_id = saved.comments()[0].id.unwrap();
        assert!(saved.take_comment(comment_id).is_some());
        repo.save(saved).await.unwrap();

        let reloaded = repo.find_by_slug("commented").await.unwrap().unwrap();
        assert!(reloaded.comments().is_empty());
    }

    #[tokio::test]
    async fn test_find_latest_filters_and_pages() {
        let repo = InMemoryPostRepository::new();
        for i in 0..12 {
            let mut p = post(&format!("Post {i}"));
            p.published_at = Utc::now() - TimeDelta::minutes(60 - i);
            if i % 2 == 0 {
                p.add_tags(vec![Tag::new("even")]);
            }
            repo.save(p).await.unwrap();
        }
        let mut scheduled = post("Future Post");
        scheduled.published_at = Utc::now() + TimeDelta::days(1);
        repo.save(scheduled).await.unwrap();

        let first = repo.find_latest(1, None).await.unwrap();
        assert_eq!(first.total, 12);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].title, "Post 11");
        assert!(first.has_next());

        let second = repo.find_latest(2, None).await.unwrap();
        assert_eq!(second.items.len(), 2);

        let even = repo.find_latest(1, Some("even")).await.unwrap();
        assert_eq!(even.total, 6);
        assert_eq!(even.items[0].title, "Post 10");
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let repo = InMemoryPostRepository::new();
        repo.save(post("Only Post")).await.unwrap();

        let page = repo.find_latest(u64::MAX, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_search_terms_are_literal() {
        let repo = InMemoryPostRepository::new();
        repo.save(post("Growth of 50% in a year")).await.unwrap();
        repo.save(post("Plain title")).await.unwrap();

        let found = repo.search("50%", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.search("%% a_", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_any_term() {
        let repo = InMemoryPostRepository::new();
        repo.save(post("Learning Rust")).await.unwrap();
        repo.save(post("Cooking pasta")).await.unwrap();
        repo.save(post("Rust and pasta")).await.unwrap();

        let found = repo.search("Rust x", 10).await.unwrap();
        assert_eq!(found.len(), 2);

        let limited = repo.search("Rust pasta", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        assert!(repo.search("a", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_post() {
        let repo = InMemoryPostRepository::new();
        let mut draft = post("Doomed");
        draft.add_tags(vec![Tag::new("keep")]);
        let saved = repo.save(draft).await.unwrap();
        let id = saved.id().unwrap();

        repo.delete(id).await.unwrap();
        assert!(repo.find_by_id(id).await.unwrap().is_none());
        assert!(repo.find_by_name("keep").await.unwrap().is_some());
        assert!(matches!(repo.delete(id).await, Err(RepoError::NotFound)));
    }
}

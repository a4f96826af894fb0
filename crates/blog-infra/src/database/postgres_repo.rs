//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbConn, EntityTrait,
    LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use blog_core::domain::{PAGE_SIZE, Page, Post, Tag, User, page_offset};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, TagRepository, UserRepository, search_terms};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// `%term%` LIKE pattern matching `term` literally, escaped with `\`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{}***", first),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL tag repository.
pub struct PostgresTagRepository {
    db: Arc<DbConn>,
}

impl PostgresTagRepository {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_all(&self) -> Result<Vec<Tag>, RepoError> {
        let tags = TagEntity::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let tag = TagEntity::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(tag.map(Into::into))
    }
}

/// PostgreSQL post repository. Loads and stores whole post aggregates.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }

    /// Attach comments and tags to a batch of post rows.
    async fn hydrate(&self, rows: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let comments = rows
            .load_many(CommentEntity, self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        let tags = rows
            .load_many_to_many(TagEntity, PostTagEntity, self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .zip(comments)
            .zip(tags)
            .map(|((row, comments), tags)| {
                row.into_domain(
                    comments.into_iter().map(Into::into).collect(),
                    tags.into_iter().map(Into::into).collect(),
                )
            })
            .collect())
    }

    async fn hydrate_one(&self, row: Option<post::Model>) -> Result<Option<Post>, RepoError> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Resolve each tag by name, inserting the ones that do not exist yet.
    async fn persist_tags(txn: &DatabaseTransaction, tags: &[Tag]) -> Result<Vec<i32>, RepoError> {
        let mut ids = Vec::with_capacity(tags.len());
        for tag in tags {
            let existing = TagEntity::find()
                .filter(tag::Column::Name.eq(tag.name.as_str()))
                .one(txn)
                .await
                .map_err(map_db_err)?;

            let id = match existing {
                Some(row) => row.id,
                None => {
                    let row = tag::ActiveModel {
                        name: Set(tag.name.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(map_db_err)?;
                    tracing::debug!(tag = %row.name, tag_id = row.id, "Created tag");
                    row.id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    async fn sync_tag_links(
        txn: &DatabaseTransaction,
        post_id: i32,
        tag_ids: Vec<i32>,
    ) -> Result<(), RepoError> {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(txn)
            .await
            .map_err(map_db_err)?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        let links = tag_ids.into_iter().map(|tag_id| post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(tag_id),
        });
        PostTagEntity::insert_many(links)
            .exec_without_returning(txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Insert new comments and delete stored ones the post no longer holds.
    async fn sync_comments(
        txn: &DatabaseTransaction,
        post_id: i32,
        post: &Post,
    ) -> Result<(), RepoError> {
        let kept: Vec<i32> = post.comments().iter().filter_map(|c| c.id).collect();

        let removed = CommentEntity::delete_many()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Id.is_not_in(kept))
            .exec(txn)
            .await
            .map_err(map_db_err)?;
        if removed.rows_affected > 0 {
            tracing::debug!(post_id, removed = removed.rows_affected, "Removed orphan comments");
        }

        for new_comment in post.comments().iter().filter(|c| c.id.is_none()) {
            comment::ActiveModel::for_post(post_id, new_comment)
                .insert(txn)
                .await
                .map_err(map_db_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, i32> for PostgresPostRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        self.hydrate_one(row).await
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        post.check()?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let mut conflict = PostEntity::find().filter(post::Column::Slug.eq(post.slug.as_str()));
        if let Some(id) = post.id() {
            conflict = conflict.filter(post::Column::Id.ne(id));
        }
        if conflict.one(&txn).await.map_err(map_db_err)?.is_some() {
            tracing::debug!(slug = %post.slug, "Rejected post with duplicate slug");
            return Err(RepoError::Constraint("post.slug_unique".to_string()));
        }

        let row = post::ActiveModel::from(&post);
        let row = if post.id().is_some() {
            row.update(&txn).await
        } else {
            row.insert(&txn).await
        }
        .map_err(map_db_err)?;

        let tag_ids = Self::persist_tags(&txn, post.tags()).await?;
        Self::sync_tag_links(&txn, row.id, tag_ids).await?;
        Self::sync_comments(&txn, row.id, &post).await?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::info!(post_id = row.id, slug = %row.slug, "Post saved");

        self.find_by_id(row.id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        CommentEntity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let row = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        self.hydrate_one(row).await
    }

    async fn find_latest(&self, page: u64, tag: Option<&str>) -> Result<Page<Post>, RepoError> {
        let page = page.max(1);

        let mut query = PostEntity::find()
            .filter(post::Column::PublishedAt.lte(Utc::now()))
            .order_by_desc(post::Column::PublishedAt);
        if let Some(name) = tag {
            query = query
                .inner_join(TagEntity)
                .filter(tag::Column::Name.eq(name));
        }

        let paginator = query.paginate(self.db.as_ref(), PAGE_SIZE);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        if page_offset(page, PAGE_SIZE) >= total {
            return Ok(Page::new(Vec::new(), page, PAGE_SIZE, total));
        }
        let rows = paginator.fetch_page(page - 1).await.map_err(map_db_err)?;

        let items = self.hydrate(rows).await?;
        Ok(Page::new(items, page, PAGE_SIZE, total))
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let condition = terms
            .iter()
            .fold(Condition::any(), |cond, term| {
                cond.add(
                    post::Column::Title.like(LikeExpr::new(contains_pattern(term)).escape('\\')),
                )
            });

        let rows = PostEntity::find()
            .filter(condition)
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        self.hydrate(rows).await
    }
}

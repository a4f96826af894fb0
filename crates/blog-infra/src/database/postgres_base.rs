use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel, PrimaryKeyTrait, SqlErr,
    TryIntoModel,
};

use blog_core::error::RepoError;
use blog_core::ports::BaseRepository;

/// Database constraint names and the message keys reported for them.
const CONSTRAINT_KEYS: &[(&str, &str)] = &[
    ("blog_post_slug_key", "post.slug_unique"),
    ("blog_user_email_key", "user.email_unique"),
    ("blog_tag_name_key", "tag.name_unique"),
    ("fk_blog_post_author", "post.unknown_author"),
    ("fk_blog_comment_author", "comment.unknown_author"),
    ("fk_blog_comment_post", "post.not_found"),
    ("fk_blog_post_tag_post", "post.not_found"),
];

/// Message key for a raw constraint violation. Unknown constraints get a
/// generic key so driver text never reaches clients.
pub(crate) fn constraint_key(raw: &str) -> &'static str {
    CONSTRAINT_KEYS
        .iter()
        .find(|(name, _)| raw.contains(name))
        .map(|(_, key)| *key)
        .unwrap_or("constraint_violation")
}

/// Translate a SeaORM error into the repository error the domain understands.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(raw))
        | Some(SqlErr::ForeignKeyConstraintViolation(raw)) => {
            let key = constraint_key(&raw);
            tracing::warn!(key, error = %raw, "Constraint violation");
            return RepoError::Constraint(key.to_string());
        }
        _ => {}
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// Generic PostgreSQL repository for flat entities (no owned collections).
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: Arc<DbConn>,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    /// Accepts an owned connection or one shared with other repositories.
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self {
            db: db.into(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + TryIntoModel<E::Model> + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(self.db.as_ref()).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        // Inserts when the primary key is NotSet, updates otherwise.
        let active_model: E::ActiveModel = entity.into();
        let saved = active_model.save(self.db.as_ref()).await.map_err(map_db_err)?;

        let model = saved
            .try_into_model()
            .map_err(|e| RepoError::Query(e.to_string()))?;
        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

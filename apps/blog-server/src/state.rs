//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{
    PasswordService, PostRepository, TagRepository, TokenService, UserRepository,
};
use blog_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

impl AppState {
    /// Build the state on in-memory repositories.
    pub fn in_memory(jwt: JwtConfig) -> Self {
        let posts = Arc::new(InMemoryPostRepository::new());
        Self {
            posts: posts.clone(),
            tags: posts,
            users: Arc::new(InMemoryUserRepository::new()),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    /// Build the application state, using the database when one is configured
    /// and reachable.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match Self::with_database(config, db_config).await {
                    Ok(state) => return state,
                    Err(e) => {
                        tracing::error!(
                            "Failed to initialize database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            }
        }

        match config.database {
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).")
            }
            Some(_) if !cfg!(feature = "postgres") => {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature")
            }
            Some(_) => {}
        }
        Self::in_memory(config.jwt.clone())
    }

    #[cfg(feature = "postgres")]
    async fn with_database(
        config: &AppConfig,
        db_config: &blog_infra::DatabaseConfig,
    ) -> Result<Self, migration::DbErr> {
        use blog_infra::{PostgresPostRepository, PostgresTagRepository, PostgresUserRepository};
        use migration::MigratorTrait;

        let conn = blog_infra::database::connect(db_config).await?;
        if config.auto_migrate {
            migration::Migrator::up(&conn, None).await?;
            tracing::info!("Database migrations applied");
        }

        let conn = Arc::new(conn);
        Ok(Self {
            posts: Arc::new(PostgresPostRepository::new(Arc::clone(&conn))),
            tags: Arc::new(PostgresTagRepository::new(Arc::clone(&conn))),
            users: Arc::new(PostgresUserRepository::new(conn)),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
        })
    }
}

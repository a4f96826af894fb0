//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blog_infra::{DatabaseConfig, JwtConfig};

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations before serving.
    pub auto_migrate: bool,
    pub jwt: JwtConfig,
    pub telemetry: TelemetryConfig,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut db = DatabaseConfig::new(url);
            db.max_connections = parsed("DB_MAX_CONNECTIONS", db.max_connections);
            db.min_connections = parsed("DB_MIN_CONNECTIONS", db.min_connections);
            db.sqlx_logging = flag("DB_LOG_STATEMENTS", db.sqlx_logging);
            db
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", jwt_defaults.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            database,
            auto_migrate: flag("DB_AUTO_MIGRATE", false),
            jwt,
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Warn about settings that are unsafe outside development.
    pub fn warn_insecure(&self) {
        if !self.jwt.uses_default_secret() {
            return;
        }
        let production = env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);
        if production {
            tracing::error!("SECURITY: default JWT secret in production, set JWT_SECRET");
        } else {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variables_use_defaults() {
        assert_eq!(parsed("BLOG_TEST_UNSET_PORT", 8080u16), 8080);
        assert!(flag("BLOG_TEST_UNSET_FLAG", true));
    }
}

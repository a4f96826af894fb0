//! Domain-level error types.

use thiserror::Error;
use validator::ValidationErrors;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: i32 },

    /// One or more constraint violations, as message keys (e.g. `post.too_many_tags`).
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// The acting user does not own what they tried to change.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(key: impl Into<String>) -> Self {
        Self::Validation(vec![key.into()])
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}.{}", field, e.code))
                })
            })
            .collect();
        // field_errors() is backed by a HashMap
        messages.sort();
        messages.dedup();
        Self::Validation(messages)
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

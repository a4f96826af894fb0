//! # Blog Core
//!
//! The domain layer of the blog service: posts, comments, tags and authors,
//! their validation rules, and the repository ports infrastructure implements.
//! This crate has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod slug;

pub use error::{DomainError, RepoError};

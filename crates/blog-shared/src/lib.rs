//! # Blog Shared
//!
//! Request and response types of the blog HTTP API, shared with clients.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, PageResponse};

//! Tag cloud endpoint.

use actix_web::{HttpResponse, web};
use blog_shared::dto::TagResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/tags - every known tag, alphabetically.
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags: Vec<TagResponse> = state
        .tags
        .find_all()
        .await?
        .into_iter()
        .map(|t| TagResponse {
            id: t.id,
            name: t.name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(tags))
}

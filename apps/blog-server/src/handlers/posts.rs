//! Post, comment and listing endpoints.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};

use blog_core::domain::{Comment, Page, Post, Tag};
use blog_shared::PageResponse;
use blog_shared::dto::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, ListPostsQuery, PostResponse,
    PostSummaryResponse, SearchQuery, UpdatePostRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: u64 = 10;
const MAX_SEARCH_LIMIT: u64 = 50;

fn tag_names(post: &Post) -> Vec<String> {
    post.tags().iter().map(|t| t.name.clone()).collect()
}

fn summary_response(post: &Post) -> PostSummaryResponse {
    PostSummaryResponse {
        id: post.id(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        summary: post.summary.clone(),
        author_id: post.author_id,
        published_at: post.published_at.to_rfc3339(),
        tags: tag_names(post),
    }
}

fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        summary: post.summary.clone(),
        content: post.content().to_string(),
        author_id: post.author_id,
        published_at: post.published_at.to_rfc3339(),
        tags: tag_names(post),
        comments: post
            .comments()
            .iter()
            .map(|c| CommentResponse {
                id: c.id,
                author_id: c.author_id,
                content: c.content.clone(),
                published_at: c.published_at.to_rfc3339(),
            })
            .collect(),
    }
}

fn page_response(page: Page<Post>) -> PageResponse<PostSummaryResponse> {
    let last_page = page.last_page();
    let page = page.map(|p| summary_response(&p));
    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        last_page,
    }
}

async fn find_post(state: &AppState, slug: &str) -> AppResult<Post> {
    state
        .posts
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post '{}' not found", slug)))
}

fn ensure_author(post: &Post, identity: &Identity) -> AppResult<()> {
    post.ensure_authored_by(identity.user_id).map_err(|e| {
        tracing::warn!(
            user_id = identity.user_id,
            slug = %post.slug,
            "Rejected change to another author's post"
        );
        e.into()
    })
}

fn parse_published_at(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| AppError::BadRequest(format!("invalid published_at: {}", e)))
}

/// GET /api/posts?page=&tag=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let page = state
        .posts
        .find_latest(query.page.unwrap_or(1), tag)
        .await?;

    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/posts/search?q=&limit=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let found: Vec<PostSummaryResponse> = state
        .posts
        .search(&query.q, limit)
        .await?
        .iter()
        .map(summary_response)
        .collect();

    Ok(HttpResponse::Ok().json(found))
}

/// GET /api/posts/{slug}
pub async fn show(state: web::Data<AppState>, slug: web::Path<String>) -> AppResult<HttpResponse> {
    let post = find_post(&state, &slug).await?;
    Ok(HttpResponse::Ok().json(post_response(&post)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut post = Post::new(identity.user_id, req.title, req.summary, req.content)?;
    if let Some(published_at) = req.published_at.as_deref() {
        post.published_at = parse_published_at(published_at)?;
    }
    post.add_tags(Tag::parse_list(&req.tags));

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = ?saved.id(), slug = %saved.slug, author_id = identity.user_id, "Post created");

    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/api/posts/{}", saved.slug)))
        .json(post_response(&saved)))
}

/// PUT /api/posts/{slug}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let mut post = find_post(&state, &slug).await?;
    ensure_author(&post, &identity)?;

    if let Some(title) = req.title {
        post.set_title(title);
    }
    if let Some(summary) = req.summary {
        post.summary = summary;
    }
    if let Some(content) = req.content {
        post.set_content(content)?;
    }
    if let Some(tags) = req.tags {
        post.clear_tags();
        post.add_tags(Tag::parse_list(&tags));
    }

    let saved = state.posts.save(post).await?;
    Ok(HttpResponse::Ok().json(post_response(&saved)))
}

/// DELETE /api/posts/{slug} - removes the post together with its comments.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &slug).await?;
    ensure_author(&post, &identity)?;

    let id = post
        .id()
        .ok_or_else(|| AppError::Internal("stored post without id".to_string()))?;
    state.posts.delete(id).await?;
    tracing::info!(post_id = id, slug = %post.slug, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{slug}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = Comment::new(identity.user_id, body.into_inner().content);
    comment.check()?;

    let mut post = find_post(&state, &slug).await?;
    post.add_comment(comment);
    let saved = state.posts.save(post).await?;

    Ok(HttpResponse::Created().json(post_response(&saved)))
}

/// DELETE /api/posts/{slug}/comments/{comment_id} - allowed for the comment's
/// author and the post's author.
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i32)>,
) -> AppResult<HttpResponse> {
    let (slug, comment_id) = path.into_inner();
    let mut post = find_post(&state, &slug).await?;

    post.remove_comment_by(comment_id, identity.user_id)?;

    state.posts.save(post).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use blog_infra::JwtConfig;
    use serde_json::{Value, json};

    use crate::handlers::configure_routes;
    use crate::state::AppState;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;

    fn fixtures() -> (AppState, String, String) {
        let state = AppState::in_memory(JwtConfig::default());
        let alice = state
            .tokens
            .generate_token(ALICE, "alice@example.com")
            .unwrap();
        let bob = state
            .tokens
            .generate_token(BOB, "bob@example.com")
            .unwrap();
        (state, alice, bob)
    }

    fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }

    fn new_post(title: &str, tags: &str) -> Value {
        json!({
            "title": title,
            "summary": "A short summary",
            "content": "A body that is comfortably long enough",
            "tags": tags,
        })
    }

    #[actix_web::test]
    async fn test_create_and_show_post() {
        let (state, alice, _) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Hello World", "rust, web, rust"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["slug"], "hello-world");
        assert_eq!(created["author_id"], ALICE);
        assert_eq!(created["tags"], json!(["rust", "web"]));

        let req = test::TestRequest::get()
            .uri("/api/posts/hello-world")
            .to_request();
        let shown: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(shown["title"], "Hello World");
        assert_eq!(shown["comments"], json!([]));
    }

    #[actix_web::test]
    async fn test_create_requires_authentication() {
        let (state, _, _) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(new_post("Anonymous", ""))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_constraint_violations() {
        let (state, alice, _) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Tag Heavy", "a, b, c, d, e"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"], json!(["post.too_many_tags"]));

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(json!({ "title": "Short", "summary": "S", "content": "tiny" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("!!!", ""))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"], json!(["post.blank_slug"]));

        let first = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Same Title", ""))
            .to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::CREATED);
        let second = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Same title", ""))
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"], json!(["post.slug_unique"]));
    }

    #[actix_web::test]
    async fn test_only_author_may_update_or_delete() {
        let (state, alice, bob) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Alice Writes", "rust"))
            .to_request();
        test::call_service(&app, req).await;

        let req = authed(test::TestRequest::put().uri("/api/posts/alice-writes"), &bob)
            .set_json(json!({ "summary": "Hijacked" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = authed(test::TestRequest::delete().uri("/api/posts/alice-writes"), &bob)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = authed(test::TestRequest::put().uri("/api/posts/alice-writes"), &alice)
            .set_json(json!({ "summary": "Edited", "tags": "web" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["summary"], "Edited");
        assert_eq!(updated["tags"], json!(["web"]));
    }

    #[actix_web::test]
    async fn test_comments_and_cascading_delete() {
        let (state, alice, bob) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(new_post("Discussed", ""))
            .to_request();
        test::call_service(&app, req).await;

        let req = authed(
            test::TestRequest::post().uri("/api/posts/discussed/comments"),
            &bob,
        )
        .set_json(json!({ "content": "Great post, thanks!" }))
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["comments"][0]["author_id"], BOB);
        let comment_id = body["comments"][0]["id"].as_i64().unwrap();

        let req = authed(
            test::TestRequest::post().uri("/api/posts/discussed/comments"),
            &bob,
        )
        .set_json(json!({ "content": "   " }))
        .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let req = authed(
            test::TestRequest::delete().uri(&format!("/api/posts/discussed/comments/{comment_id}")),
            &alice,
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = authed(test::TestRequest::delete().uri("/api/posts/discussed"), &alice)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri("/api/posts/discussed")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_listing_search_and_tags() {
        let (state, alice, _) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        for (title, tags) in [("Rust Ownership", "rust"), ("Async Web", "web, rust"), ("Gardening", "")] {
            let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
                .set_json(new_post(title, tags))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["page"], 1);
        assert_eq!(page["last_page"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts?page={}", u64::MAX))
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["items"], json!([]));

        let req = test::TestRequest::get()
            .uri("/api/posts?tag=rust")
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 2);

        let req = test::TestRequest::get()
            .uri("/api/posts/search?q=Gardening")
            .to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["slug"], "gardening");

        let req = test::TestRequest::get().uri("/api/tags").to_request();
        let tags: Value = test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = tags
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["rust", "web"]);
    }

    #[actix_web::test]
    async fn test_scheduled_post_hidden_from_listing() {
        let (state, alice, _) = fixtures();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let mut body = new_post("Coming Soon", "");
        body["published_at"] = json!("2999-01-01T00:00:00Z");
        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 0);

        let mut bad = new_post("Bad Date", "");
        bad["published_at"] = json!("yesterday");
        let req = authed(test::TestRequest::post().uri("/api/posts"), &alice)
            .set_json(bad)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}

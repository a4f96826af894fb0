//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod tags;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    // Registered before "/{slug}" so it is not taken for a slug.
                    .route("/search", web::get().to(posts::search))
                    .route("/{slug}", web::get().to(posts::show))
                    .route("/{slug}", web::put().to(posts::update))
                    .route("/{slug}", web::delete().to(posts::delete))
                    .route("/{slug}/comments", web::post().to(posts::add_comment))
                    .route(
                        "/{slug}/comments/{comment_id}",
                        web::delete().to(posts::delete_comment),
                    ),
            )
            .route("/tags", web::get().to(tags::list)),
    );
}

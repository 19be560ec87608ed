use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts", get(handlers::list_my_posts))
        .route("/posts/:id", get(handlers::get_post))
        .route("/posts/:id", patch(handlers::update_post))
        .route("/posts/:id", delete(handlers::delete_post))
        .route("/posts/:id/publish", post(handlers::publish_post))
        .route("/posts/:id/unpublish", post(handlers::unpublish_post))
        .route("/posts/:id/favorite", post(handlers::toggle_favorite))
}

pub fn public_posts() -> Router<AppState> {
    Router::new()
        .route("/posts/public", get(handlers::list_public_posts))
        .route("/posts/public/:share_token", get(handlers::get_public_post))
        .route("/posts/public/:share_token/like", post(handlers::toggle_like))
        .route(
            "/posts/public/:share_token/comments",
            post(handlers::add_comment),
        )
        .route(
            "/posts/public/:share_token/replies",
            post(handlers::add_reply),
        )
}

pub fn dashboard() -> Router<AppState> {
    Router::new().route("/dashboard", get(handlers::get_dashboard))
}

use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod ip;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::posts())
        .merge(routes::public_posts())
        .merge(routes::dashboard())
        .with_state(state)
}

use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new().route("/login", post(handlers::login))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/:post_id/replies", get(handlers::list_post_replies))
        .route("/replies", post(handlers::create_reply))
        .route("/likes", post(handlers::create_like))
}

pub fn summary() -> Router<AppState> {
    Router::new().route("/summary/:post_id", get(handlers::summarize_replies))
}

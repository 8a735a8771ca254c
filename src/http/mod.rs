use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;

mod error;
mod extract;
mod handlers;
mod routes;

pub use error::AppError;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth())
        .merge(routes::posts())
        .merge(routes::summary());

    Router::new()
        .merge(routes::health())
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// CORS for the browser client. Without a configured origin any origin is
/// accepted.
pub fn cors(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(match allowed_origin {
        Some(origin) => layer.allow_origin(HeaderValue::from_str(origin)?),
        None => layer.allow_origin(Any),
    })
}

use axum::extract::{FromRequest, FromRequestParts};

use crate::http::AppError;

/// `axum::Json` whose rejection is reported as an `AppError`.
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` whose rejection is reported as an `AppError`.
#[derive(FromRequestParts, Debug, Clone, Copy, Default)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

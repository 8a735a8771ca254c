use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::feed::FeedService;
use crate::app::identity::IdentityService;
use crate::app::likes::LikeService;
use crate::app::posts::PostService;
use crate::app::replies::ReplyService;
use crate::app::summary::SummaryService;
use crate::domain::post::AggregatedPost;
use crate::domain::reply::Reply;
use crate::domain::user::NewUser;
use crate::http::extract::{JsonBody, PathParam};
use crate::http::AppError;
use crate::AppState;

const MAX_EXTERNAL_ID_LEN: usize = 128;
const MAX_CONTENT_LEN: usize = 2000;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "storage ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

fn validate_external_id(external_id: &str) -> Result<(), AppError> {
    if external_id.trim().is_empty() {
        return Err(AppError::bad_request("external_id is required"));
    }
    if external_id.chars().count() > MAX_EXTERNAL_ID_LEN {
        return Err(AppError::bad_request(
            "external_id must be at most 128 characters",
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::bad_request("content is required"));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(AppError::bad_request(
            "content must be at most 2000 characters",
        ));
    }
    Ok(())
}

fn validate_post_id(post_id: i64) -> Result<(), AppError> {
    if post_id <= 0 {
        return Err(AppError::bad_request("post_id must be positive"));
    }
    Ok(())
}

async fn resolve_user(state: &AppState, user: NewUser<'_>) -> Result<i64, AppError> {
    IdentityService::new(state.store.clone())
        .resolve_or_create(user)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, external_id = %user.external_id, "failed to resolve user");
            AppError::from_store(&err, "failed to resolve user")
        })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "uid")]
    pub external_id: String,
    #[serde(default, alias = "username")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_external_id(&payload.external_id)?;

    let user = NewUser {
        external_id: &payload.external_id,
        display_name: payload.display_name.as_deref(),
        email: payload.email.as_deref(),
    };
    let user_id = resolve_user(&state, user).await?;

    Ok(Json(LoginResponse { user_id }))
}

pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AggregatedPost>>, AppError> {
    let service = FeedService::new(state.store.clone(), state.fan_out);
    let posts = service.list_posts_with_detail().await.map_err(|err| {
        tracing::error!(error = ?err, fan_out = %state.fan_out, "failed to list posts");
        AppError::from_store(&err, "failed to list posts")
    })?;

    Ok(Json(posts))
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    #[serde(alias = "uid")]
    pub external_id: String,
    pub content: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> Result<Json<AggregatedPost>, AppError> {
    validate_external_id(&payload.external_id)?;
    validate_content(&payload.content)?;

    let user_id = resolve_user(&state, NewUser::anonymous(&payload.external_id)).await?;

    let service = PostService::new(state.store.clone());
    let post = service
        .create_post(user_id, &payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, "failed to create post");
            AppError::from_store(&err, "failed to create post")
        })?;

    Ok(Json(post))
}

pub async fn list_post_replies(
    PathParam(post_id): PathParam<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Reply>>, AppError> {
    validate_post_id(post_id)?;

    let service = ReplyService::new(state.store.clone());
    let replies = service.list_replies(post_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id, "failed to list replies");
        AppError::from_store(&err, "failed to list replies")
    })?;

    Ok(Json(replies))
}

#[derive(Deserialize)]
pub struct CreateReplyRequest {
    #[serde(alias = "uid")]
    pub external_id: String,
    pub post_id: i64,
    pub content: String,
}

pub async fn create_reply(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateReplyRequest>,
) -> Result<Json<Reply>, AppError> {
    validate_external_id(&payload.external_id)?;
    validate_post_id(payload.post_id)?;
    validate_content(&payload.content)?;

    let user_id = resolve_user(&state, NewUser::anonymous(&payload.external_id)).await?;

    let service = ReplyService::new(state.store.clone());
    let reply = service
        .create_reply(payload.post_id, user_id, &payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, post_id = payload.post_id, "failed to create reply");
            AppError::from_store(&err, "failed to create reply")
        })?;

    Ok(Json(reply))
}

#[derive(Deserialize)]
pub struct CreateLikeRequest {
    #[serde(alias = "uid")]
    pub external_id: String,
    pub post_id: i64,
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub created: bool,
}

pub async fn create_like(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateLikeRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    validate_external_id(&payload.external_id)?;
    validate_post_id(payload.post_id)?;

    let user_id = resolve_user(&state, NewUser::anonymous(&payload.external_id)).await?;

    let service = LikeService::new(state.store.clone());
    let outcome = service
        .create_like(payload.post_id, user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, post_id = payload.post_id, "failed to like post");
            AppError::from_store(&err, "failed to like post")
        })?;

    Ok(Json(LikeResponse {
        created: outcome.created(),
    }))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

pub async fn summarize_replies(
    PathParam(post_id): PathParam<i64>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    validate_post_id(post_id)?;

    let service = SummaryService::new(state.store.clone(), state.summarizer.clone());
    let summary = service.summarize(post_id).await;

    Ok(Json(SummaryResponse { summary }))
}

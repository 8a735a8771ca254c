use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::post::Post;
use crate::domain::reply::Reply;
use crate::domain::user::NewUser;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Entity named by a foreign reference that the store rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    User,
    Post,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Post => f.write_str("post"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("referenced {0} does not exist")]
    MissingReference(Reference),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The relational operations the services are built on.
///
/// Listings are ordered by the store: posts newest first, replies oldest
/// first, both falling back to ascending id on equal timestamps.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn find_user_id(&self, external_id: &str) -> StoreResult<Option<i64>>;

    /// Returns `None` when the external id already belongs to a user.
    async fn insert_user(&self, user: NewUser<'_>) -> StoreResult<Option<i64>>;

    async fn insert_post(&self, user_id: i64, content: &str) -> StoreResult<Post>;

    async fn list_posts(&self) -> StoreResult<Vec<Post>>;

    async fn insert_reply(&self, post_id: i64, user_id: i64, content: &str) -> StoreResult<Reply>;

    async fn list_replies(&self, post_id: i64) -> StoreResult<Vec<Reply>>;

    async fn list_reply_texts(&self, post_id: i64) -> StoreResult<Vec<String>>;

    /// Returns `false` when the pair was already recorded.
    async fn insert_like(&self, post_id: i64, user_id: i64) -> StoreResult<bool>;

    async fn count_likes(&self, post_id: i64) -> StoreResult<i64>;

    /// Like counts keyed by post id. Posts without likes may be absent.
    async fn count_likes_for(&self, post_ids: &[i64]) -> StoreResult<HashMap<i64, i64>>;

    /// Replies of every listed post, grouped by post in reply order.
    async fn list_replies_for(&self, post_ids: &[i64]) -> StoreResult<Vec<Reply>>;
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::reply::Reply;

/// A post row as stored, without derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A post enriched with its like count and replies, built per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedPost {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub likes: i64,
    pub replies: Vec<Reply>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl AggregatedPost {
    pub fn new(post: Post, likes: i64, replies: Vec<Reply>) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            content: post.content,
            likes,
            replies,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<Post> for AggregatedPost {
    fn from(post: Post) -> Self {
        Self::new(post, 0, Vec::new())
    }
}

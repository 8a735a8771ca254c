use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::app::likes::LikeService;
use crate::app::posts::PostService;
use crate::app::replies::ReplyService;
use crate::app::store::{Store, StoreResult};
use crate::domain::post::AggregatedPost;
use crate::domain::reply::Reply;

/// How the per-post like counts and replies are fetched for a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanOut {
    /// One grouped query for like counts and one for replies, joined in memory.
    #[default]
    Batched,
    /// Two follow-up queries for every post.
    PerPost,
}

impl FromStr for FanOut {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "batched" => Ok(Self::Batched),
            "per_post" => Ok(Self::PerPost),
            other => Err(format!("unknown fan-out strategy: {}", other)),
        }
    }
}

impl fmt::Display for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batched => f.write_str("batched"),
            Self::PerPost => f.write_str("per_post"),
        }
    }
}

#[derive(Clone)]
pub struct FeedService {
    posts: PostService,
    likes: LikeService,
    replies: ReplyService,
    store: Arc<dyn Store>,
    fan_out: FanOut,
}

impl FeedService {
    pub fn new(store: Arc<dyn Store>, fan_out: FanOut) -> Self {
        Self {
            posts: PostService::new(store.clone()),
            likes: LikeService::new(store.clone()),
            replies: ReplyService::new(store.clone()),
            store,
            fan_out,
        }
    }

    /// Every post, newest first, with its like count and replies.
    ///
    /// Only the base post query is fatal. A failed like-count or reply
    /// fetch is logged and leaves the affected posts at zero likes or with
    /// no replies. The listing is not a snapshot: writes that land between
    /// the base query and the follow-ups may or may not be reflected.
    pub async fn list_posts_with_detail(&self) -> StoreResult<Vec<AggregatedPost>> {
        let posts = self.posts.list_posts().await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        match self.fan_out {
            FanOut::Batched => {
                let post_ids: Vec<i64> = posts.iter().map(|post| post.id).collect();

                let likes = match self.store.count_likes_for(&post_ids).await {
                    Ok(likes) => likes,
                    Err(err) => {
                        warn!(error = ?err, posts = post_ids.len(), "failed to count likes");
                        HashMap::new()
                    }
                };

                let mut replies = match self.store.list_replies_for(&post_ids).await {
                    Ok(replies) => group_by_post(replies),
                    Err(err) => {
                        warn!(error = ?err, posts = post_ids.len(), "failed to list replies");
                        HashMap::new()
                    }
                };

                Ok(posts
                    .into_iter()
                    .map(|post| {
                        let like_count = likes.get(&post.id).copied().unwrap_or(0);
                        let post_replies = replies.remove(&post.id).unwrap_or_default();
                        AggregatedPost::new(post, like_count, post_replies)
                    })
                    .collect())
            }
            FanOut::PerPost => {
                let mut aggregated = Vec::with_capacity(posts.len());
                for post in posts {
                    let like_count = match self.likes.count_likes(post.id).await {
                        Ok(count) => count,
                        Err(err) => {
                            warn!(error = ?err, post_id = post.id, "failed to count likes");
                            0
                        }
                    };
                    let post_replies = match self.replies.list_replies(post.id).await {
                        Ok(replies) => replies,
                        Err(err) => {
                            warn!(error = ?err, post_id = post.id, "failed to list replies");
                            Vec::new()
                        }
                    };
                    aggregated.push(AggregatedPost::new(post, like_count, post_replies));
                }
                Ok(aggregated)
            }
        }
    }
}

fn group_by_post(replies: Vec<Reply>) -> HashMap<i64, Vec<Reply>> {
    let mut grouped: HashMap<i64, Vec<Reply>> = HashMap::new();
    for reply in replies {
        grouped.entry(reply.post_id).or_default().push(reply);
    }
    grouped
}

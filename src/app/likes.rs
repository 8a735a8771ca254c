use std::sync::Arc;

use crate::app::store::{Store, StoreResult};
use crate::domain::like::LikeOutcome;

#[derive(Clone)]
pub struct LikeService {
    store: Arc<dyn Store>,
}

impl LikeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Duplicate pairs are absorbed by the store's uniqueness constraint;
    /// there is no read before the insert.
    pub async fn create_like(&self, post_id: i64, user_id: i64) -> StoreResult<LikeOutcome> {
        let inserted = self.store.insert_like(post_id, user_id).await?;
        Ok(if inserted {
            LikeOutcome::Created
        } else {
            LikeOutcome::AlreadyLiked
        })
    }

    pub async fn count_likes(&self, post_id: i64) -> StoreResult<i64> {
        self.store.count_likes(post_id).await
    }
}

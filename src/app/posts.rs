use std::sync::Arc;

use crate::app::store::{Store, StoreResult};
use crate::domain::post::{AggregatedPost, Post};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// A fresh post carries no likes and no replies.
    pub async fn create_post(&self, user_id: i64, content: &str) -> StoreResult<AggregatedPost> {
        let post = self.store.insert_post(user_id, content).await?;
        Ok(AggregatedPost::from(post))
    }

    pub async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.store.list_posts().await
    }
}

use std::sync::Arc;

use crate::app::store::{Store, StoreResult};
use crate::domain::reply::Reply;

#[derive(Clone)]
pub struct ReplyService {
    store: Arc<dyn Store>,
}

impl ReplyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_reply(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> StoreResult<Reply> {
        self.store.insert_reply(post_id, user_id, content).await
    }

    pub async fn list_replies(&self, post_id: i64) -> StoreResult<Vec<Reply>> {
        self.store.list_replies(post_id).await
    }
}

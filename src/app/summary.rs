use std::sync::Arc;

use tracing::{error, warn};

use crate::app::store::Store;
use crate::infra::summarizer::Summarizer;

/// Returned when the provider fails or answers without any text.
pub const SUMMARY_UNAVAILABLE: &str = "summary unavailable";
/// Returned when the post has no replies; the provider is not called.
pub const NO_REPLIES: &str = "no replies to summarize";

#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn Store>,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn Store>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Condense a post's replies. Always yields displayable text.
    pub async fn summarize(&self, post_id: i64) -> String {
        let texts = match self.store.list_reply_texts(post_id).await {
            Ok(texts) => texts,
            Err(err) => {
                error!(error = ?err, post_id, "failed to load replies for summary");
                return SUMMARY_UNAVAILABLE.to_string();
            }
        };
        if texts.is_empty() {
            return NO_REPLIES.to_string();
        }

        match self.summarizer.summarize(&texts.join("\n")).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                warn!(post_id, "summarizer returned no candidates");
                SUMMARY_UNAVAILABLE.to_string()
            }
            Err(err) => {
                error!(error = ?err, post_id, "failed to summarize replies");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

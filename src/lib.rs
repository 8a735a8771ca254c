pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::app::feed::FanOut;
use crate::app::store::Store;
use crate::infra::summarizer::Summarizer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub summarizer: Arc<dyn Summarizer>,
    pub fan_out: FanOut,
}

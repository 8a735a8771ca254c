use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::SummarizerConfig;

/// Instruction placed ahead of the reply texts.
pub const SUMMARY_PROMPT: &str = "Summarize the following set of replies:\n";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarizer API key is not configured")]
    NotConfigured,
    #[error("summarizer endpoint cannot carry a path: {0}")]
    Endpoint(Url),
    #[error("summarizer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summarizer returned status {0}")]
    Status(StatusCode),
}

/// Text-generation provider used to condense reply threads.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns `Ok(None)` when the provider answered without any usable text.
    async fn summarize(&self, text: &str) -> Result<Option<String>, SummarizerError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Client for a Gemini-compatible `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiSummarizer {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Appends the `generateContent` path to the endpoint, keeping any prefix it has.
    fn generate_url(&self) -> Result<Url, SummarizerError> {
        let method = format!("{}:generateContent", self.model);
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| SummarizerError::Endpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .extend(["v1beta", "models", method.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str) -> Result<Option<String>, SummarizerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizerError::NotConfigured)?;

        let prompt = format!("{}{}", SUMMARY_PROMPT, text);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig { candidate_count: 1 },
        };

        let response = self
            .client
            .post(self.generate_url()?)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::Status(status));
        }

        let response: GenerateResponse = response.json().await?;
        Ok(response.into_text())
    }
}

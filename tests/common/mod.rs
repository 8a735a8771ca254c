#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use murmur::app::feed::FanOut;
use murmur::app::store::{Reference, Store, StoreError, StoreResult};
use murmur::domain::post::Post;
use murmur::domain::reply::Reply;
use murmur::domain::user::{NewUser, User};
use murmur::infra::summarizer::{Summarizer, SummarizerError};
use murmur::AppState;

// ---------------------------------------------------------------------------
// MemoryStore: the relational collaborator, kept in process
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    replies: Vec<Reply>,
    // (user_id, post_id), the uniqueness constraint
    likes: BTreeSet<(i64, i64)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

struct Clock {
    now: OffsetDateTime,
    step: Duration,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Mutex<Clock>,
    queries: AtomicUsize,
    fail_like_counts: AtomicBool,
    fail_reply_lists: AtomicBool,
    fail_all: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Sqlx(sqlx::Error::PoolTimedOut)
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock: Mutex::new(Clock {
                now: datetime!(2025-01-01 0:00 UTC),
                step: Duration::seconds(1),
            }),
            queries: AtomicUsize::new(0),
            fail_like_counts: AtomicBool::new(false),
            fail_reply_lists: AtomicBool::new(false),
            fail_all: AtomicBool::new(false),
        }
    }
}

impl MemoryStore {
    /// Subsequent inserts share one timestamp.
    pub fn freeze_clock(&self) {
        self.clock.lock().unwrap().step = Duration::ZERO;
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_queries(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    pub fn fail_like_counts(&self, fail: bool) {
        self.fail_like_counts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reply_lists(&self, fail: bool) {
        self.fail_reply_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn users_with_external_id(&self, external_id: &str) -> Vec<User> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .filter(|user| user.external_id == external_id)
            .cloned()
            .collect()
    }

    pub fn like_rows(&self, post_id: i64) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.likes.iter().filter(|(_, post)| *post == post_id).count()
    }

    fn tick(&self) -> OffsetDateTime {
        let mut clock = self.clock.lock().unwrap();
        let now = clock.now;
        let step = clock.step;
        clock.now += step;
        now
    }

    fn begin(&self) -> StoreResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn sorted_replies(mut replies: Vec<Reply>) -> Vec<Reply> {
    replies.sort_by(|a, b| {
        a.post_id
            .cmp(&b.post_id)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    replies
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.begin()
    }

    async fn find_user_id(&self, external_id: &str) -> StoreResult<Option<i64>> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|user| user.external_id == external_id)
            .map(|user| user.id))
    }

    async fn insert_user(&self, user: NewUser<'_>) -> StoreResult<Option<i64>> {
        self.begin()?;
        let created_at = self.tick();
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.external_id == user.external_id) {
            return Ok(None);
        }
        let id = tables.next_id();
        tables.users.push(User {
            id,
            external_id: user.external_id.to_string(),
            display_name: user.display_name.map(str::to_string),
            email: user.email.map(str::to_string),
            created_at,
        });
        Ok(Some(id))
    }

    async fn insert_post(&self, user_id: i64, content: &str) -> StoreResult<Post> {
        self.begin()?;
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.iter().any(|user| user.id == user_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        let post = Post {
            id: tables.next_id(),
            user_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn insert_reply(&self, post_id: i64, user_id: i64, content: &str) -> StoreResult<Reply> {
        self.begin()?;
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.iter().any(|post| post.id == post_id) {
            return Err(StoreError::MissingReference(Reference::Post));
        }
        if !tables.users.iter().any(|user| user.id == user_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        let reply = Reply {
            id: tables.next_id(),
            post_id,
            user_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.replies.push(reply.clone());
        Ok(reply)
    }

    async fn list_replies(&self, post_id: i64) -> StoreResult<Vec<Reply>> {
        self.begin()?;
        if self.fail_reply_lists.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let tables = self.tables.lock().unwrap();
        let replies = tables
            .replies
            .iter()
            .filter(|reply| reply.post_id == post_id)
            .cloned()
            .collect();
        Ok(sorted_replies(replies))
    }

    async fn list_reply_texts(&self, post_id: i64) -> StoreResult<Vec<String>> {
        let replies = self.list_replies(post_id).await?;
        Ok(replies.into_iter().map(|reply| reply.content).collect())
    }

    async fn insert_like(&self, post_id: i64, user_id: i64) -> StoreResult<bool> {
        self.begin()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.iter().any(|post| post.id == post_id) {
            return Err(StoreError::MissingReference(Reference::Post));
        }
        if !tables.users.iter().any(|user| user.id == user_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        Ok(tables.likes.insert((user_id, post_id)))
    }

    async fn count_likes(&self, post_id: i64) -> StoreResult<i64> {
        self.begin()?;
        if self.fail_like_counts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables.likes.iter().filter(|(_, post)| *post == post_id).count() as i64)
    }

    async fn count_likes_for(&self, post_ids: &[i64]) -> StoreResult<HashMap<i64, i64>> {
        self.begin()?;
        if self.fail_like_counts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let tables = self.tables.lock().unwrap();
        let mut counts = HashMap::new();
        for (_, post_id) in tables.likes.iter().filter(|(_, post)| post_ids.contains(post)) {
            *counts.entry(*post_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn list_replies_for(&self, post_ids: &[i64]) -> StoreResult<Vec<Reply>> {
        self.begin()?;
        if self.fail_reply_lists.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let tables = self.tables.lock().unwrap();
        let replies = tables
            .replies
            .iter()
            .filter(|reply| post_ids.contains(&reply.post_id))
            .cloned()
            .collect();
        Ok(sorted_replies(replies))
    }
}

// ---------------------------------------------------------------------------
// StubSummarizer: records what it was asked to summarize
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum StubAnswer {
    Text(String),
    Empty,
    Fail,
}

pub struct StubSummarizer {
    answer: Mutex<StubAnswer>,
    inputs: Mutex<Vec<String>>,
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self {
            answer: Mutex::new(StubAnswer::Text("stub summary".to_string())),
            inputs: Mutex::new(Vec::new()),
        }
    }
}

impl StubSummarizer {
    pub fn answer_with(&self, answer: StubAnswer) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, text: &str) -> Result<Option<String>, SummarizerError> {
        self.inputs.lock().unwrap().push(text.to_string());
        match self.answer.lock().unwrap().clone() {
            StubAnswer::Text(text) => Ok(Some(text)),
            StubAnswer::Empty => Ok(None),
            StubAnswer::Fail => Err(SummarizerError::NotConfigured),
        }
    }
}

// ---------------------------------------------------------------------------
// TestApp: the real router over the in-process collaborators
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub summarizer: Arc<StubSummarizer>,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub fn app() -> TestApp {
    TestApp::new(FanOut::Batched)
}

impl TestApp {
    pub fn new(fan_out: FanOut) -> Self {
        let store = Arc::new(MemoryStore::default());
        let summarizer = Arc::new(StubSummarizer::default());
        let state = AppState {
            store: store.clone(),
            summarizer: summarizer.clone(),
            fan_out,
        };

        TestApp {
            router: murmur::http::router(state),
            store,
            summarizer,
        }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<String>) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body.to_string())).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request(Method::POST, path, Some(body.to_string())).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    pub async fn login(&self, external_id: &str) -> i64 {
        let resp = self
            .post_json(
                "/api/login",
                serde_json::json!({
                    "external_id": external_id,
                    "display_name": format!("User {}", external_id),
                    "email": format!("{}@example.com", external_id),
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "login failed: {:?}", resp.json());
        resp.json()["user_id"].as_i64().expect("user_id")
    }

    pub async fn create_post(&self, external_id: &str, content: &str) -> i64 {
        let resp = self
            .post_json(
                "/api/posts",
                serde_json::json!({ "external_id": external_id, "content": content }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create post failed: {:?}", resp.json());
        resp.json()["id"].as_i64().expect("post id")
    }

    pub async fn create_reply(&self, external_id: &str, post_id: i64, content: &str) -> i64 {
        let resp = self
            .post_json(
                "/api/replies",
                serde_json::json!({
                    "external_id": external_id,
                    "post_id": post_id,
                    "content": content,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create reply failed: {:?}", resp.json());
        resp.json()["id"].as_i64().expect("reply id")
    }

    pub async fn like(&self, external_id: &str, post_id: i64) -> TestResponse {
        self.post_json(
            "/api/likes",
            serde_json::json!({ "external_id": external_id, "post_id": post_id }),
        )
        .await
    }

    pub async fn posts(&self) -> Vec<Value> {
        let resp = self.get("/api/posts").await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.json().as_array().cloned().expect("posts array")
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::warn;

use crate::app::store::{Reference, Store, StoreError, StoreResult};
use crate::domain::post::Post;
use crate::domain::reply::Reply;
use crate::domain::user::NewUser;
use crate::infra::db::Db;

/// `Store` backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn reply_from_row(row: &PgRow) -> Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Keep what decoded; a bad row is logged and left out, the rest keep their order.
fn keep_decoded<T>(
    items: impl IntoIterator<Item = Result<T, sqlx::Error>>,
    what: &'static str,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(error = ?err, what, "skipping unreadable row");
                None
            }
        })
        .collect()
}

/// Classify foreign-key violations by the constraint that fired.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            let reference = match db_err.constraint() {
                Some(name) if name.ends_with("post_id_fkey") => Reference::Post,
                _ => Reference::User,
            };
            return StoreError::MissingReference(reference);
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.db.pool()).await?;
        Ok(())
    }

    async fn find_user_id(&self, external_id: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(id)
    }

    async fn insert_user(&self, user: NewUser<'_>) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar(
            "INSERT INTO users (external_id, display_name, email) VALUES ($1, $2, $3) \
             ON CONFLICT (external_id) DO NOTHING \
             RETURNING id",
        )
        .bind(user.external_id)
        .bind(user.display_name)
        .bind(user.email)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(id)
    }

    async fn insert_post(&self, user_id: i64, content: &str) -> StoreResult<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (user_id, content) VALUES ($1, $2) \
             RETURNING id, user_id, content, created_at, updated_at",
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(post_from_row(&row)?)
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, user_id, content, created_at, updated_at \
             FROM posts \
             ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(keep_decoded(rows.iter().map(post_from_row), "post"))
    }

    async fn insert_reply(&self, post_id: i64, user_id: i64, content: &str) -> StoreResult<Reply> {
        let row = sqlx::query(
            "INSERT INTO replies (post_id, user_id, content) VALUES ($1, $2, $3) \
             RETURNING id, post_id, user_id, content, created_at, updated_at",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(reply_from_row(&row)?)
    }

    async fn list_replies(&self, post_id: i64) -> StoreResult<Vec<Reply>> {
        let rows = sqlx::query(
            "SELECT id, post_id, user_id, content, created_at, updated_at \
             FROM replies \
             WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(keep_decoded(rows.iter().map(reply_from_row), "reply"))
    }

    async fn list_reply_texts(&self, post_id: i64) -> StoreResult<Vec<String>> {
        let texts = sqlx::query_scalar(
            "SELECT content FROM replies \
             WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(texts)
    }

    async fn insert_like(&self, post_id: i64, user_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, post_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_likes(&self, post_id: i64) -> StoreResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn count_likes_for(&self, post_ids: &[i64]) -> StoreResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT post_id, COUNT(*) FROM likes \
             WHERE post_id = ANY($1) \
             GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn list_replies_for(&self, post_ids: &[i64]) -> StoreResult<Vec<Reply>> {
        let rows = sqlx::query(
            "SELECT id, post_id, user_id, content, created_at, updated_at \
             FROM replies \
             WHERE post_id = ANY($1) \
             ORDER BY post_id, created_at ASC, id ASC",
        )
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(keep_decoded(rows.iter().map(reply_from_row), "reply"))
    }
}

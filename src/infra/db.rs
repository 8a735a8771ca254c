use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let mut options = PgConnectOptions::from_str(&config.database_url)
            .context("invalid DATABASE_URL")?
            .ssl_mode(config.db_ssl_mode);
        if let Some(path) = &config.db_ssl_root_cert {
            options = options.ssl_root_cert(path);
        }
        if let Some(path) = &config.db_ssl_client_cert {
            options = options.ssl_client_cert(path);
        }
        if let Some(path) = &config.db_ssl_client_key {
            options = options.ssl_client_key(path);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

use anyhow::{anyhow, Result};
use sqlx::postgres::PgSslMode;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::app::feed::FanOut;

pub const DEFAULT_SUMMARIZER_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SUMMARIZER_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub db_ssl_mode: PgSslMode,
    pub db_ssl_root_cert: Option<PathBuf>,
    pub db_ssl_client_cert: Option<PathBuf>,
    pub db_ssl_client_key: Option<PathBuf>,
    pub allowed_origin: Option<String>,
    pub summarizer: SummarizerConfig,
    pub fan_out: FanOut,
}

#[derive(Clone, Debug)]
pub struct SummarizerConfig {
    pub endpoint: Url,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = parse_http_addr(&env_or("HTTP_ADDR", "0.0.0.0:8080"))?;

        let db_ssl_mode = parse_ssl_mode(&env_or("DB_SSL_MODE", "prefer"))?;
        let fan_out = FanOut::from_str(&env_or("FEED_FAN_OUT", "batched"))
            .map_err(|err| anyhow!("invalid FEED_FAN_OUT: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            db_ssl_mode,
            db_ssl_root_cert: env_opt("DB_SSL_ROOT_CERT").map(PathBuf::from),
            db_ssl_client_cert: env_opt("DB_SSL_CLIENT_CERT").map(PathBuf::from),
            db_ssl_client_key: env_opt("DB_SSL_CLIENT_KEY").map(PathBuf::from),
            allowed_origin: env_opt("ALLOWED_ORIGIN").or_else(|| env_opt("APP_URL")),
            summarizer: SummarizerConfig::from_env()?,
            fan_out,
        })
    }
}

impl SummarizerConfig {
    pub fn from_env() -> Result<Self> {
        let endpoint = env_or("SUMMARIZER_ENDPOINT", DEFAULT_SUMMARIZER_ENDPOINT);
        let endpoint = Url::parse(&endpoint)
            .map_err(|err| anyhow!("invalid SUMMARIZER_ENDPOINT: {}", err))?;

        Ok(Self {
            endpoint,
            model: env_or("SUMMARIZER_MODEL", DEFAULT_SUMMARIZER_MODEL),
            api_key: env_opt("SUMMARIZER_API_KEY").or_else(|| env_opt("API_KEY")),
            timeout_seconds: env_or_parse("SUMMARIZER_TIMEOUT_SECONDS", "10")?,
        })
    }
}

pub fn parse_http_addr(value: &str) -> Result<SocketAddr> {
    SocketAddr::from_str(value).map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))
}

pub fn parse_ssl_mode(value: &str) -> Result<PgSslMode> {
    match value {
        "disable" => Ok(PgSslMode::Disable),
        "allow" => Ok(PgSslMode::Allow),
        "prefer" => Ok(PgSslMode::Prefer),
        "require" => Ok(PgSslMode::Require),
        "verify-ca" => Ok(PgSslMode::VerifyCa),
        "verify-full" => Ok(PgSslMode::VerifyFull),
        other => Err(anyhow!("invalid DB_SSL_MODE: {}", other)),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

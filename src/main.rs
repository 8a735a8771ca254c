use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use murmur::config::AppConfig;
use murmur::http;
use murmur::infra::{db::Db, postgres::PgStore, summarizer::GeminiSummarizer};
use murmur::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = Db::connect(&config).await?;
    let summarizer = GeminiSummarizer::new(&config.summarizer)?;
    if config.summarizer.api_key.is_none() {
        tracing::warn!("no summarizer API key configured; summaries will fall back");
    }

    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        summarizer: Arc::new(summarizer),
        fan_out: config.fan_out,
    };

    let app: Router = http::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(http::cors(config.allowed_origin.as_deref())?),
    );
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!(fan_out = %config.fan_out, "listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

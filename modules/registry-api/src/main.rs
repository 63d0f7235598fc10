use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use registry_api::{build_router, AppState};
use registry_common::AppConfig;
use registry_links::{link_check_channel, LinkCheckWorker, LinkChecker, DEFAULT_QUEUE_CAPACITY};
use registry_store::{StatementStore, MIGRATOR};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let session_secret = config
        .session_secret
        .clone()
        .context("SESSION_SECRET must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;
    MIGRATOR.run(&pool).await.context("Failed to run migrations")?;

    let store = StatementStore::new(pool, config.link_check.clone());

    let link_checks = if config.link_check.enabled {
        let (queue, rx) = link_check_channel(DEFAULT_QUEUE_CAPACITY);
        let worker = LinkCheckWorker::new(LinkChecker::http(store.clone())?, rx);
        tokio::spawn(worker.run());
        info!(timeout_secs = config.link_check.timeout.as_secs(), "Statement URL checks enabled");
        Some(queue)
    } else {
        info!("Statement URL checks disabled");
        None
    };

    let state = Arc::new(AppState {
        store,
        link_checks,
        session_secret,
        page_size: config.page_size,
    });
    let app = build_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Modern Slavery Registry starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

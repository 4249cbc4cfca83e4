// src/main.rs

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use advisor_agent::api::build_router;
use advisor_agent::config::CONFIG;
use advisor_agent::llm::client::OpenAIClient;
use advisor_agent::llm::traits::{ChatModel, Embedder};
use advisor_agent::providers::registry::ProviderRegistry;
use advisor_agent::state::build_app_state;
use advisor_agent::store::migration::run_migrations;
use advisor_agent::sync::scheduler::spawn_poll_scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let level = tracing::Level::from_str(&CONFIG.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!(database_url = %CONFIG.database_url, "starting advisor agent");

    let options = SqliteConnectOptions::from_str(&CONFIG.database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.sqlite_max_connections)
        .connect_with(options)
        .await
        .context("failed to open database")?;
    run_migrations(&pool).await?;

    let client = Arc::new(OpenAIClient::new()?);
    let llm: Arc<dyn ChatModel> = client.clone();
    let embedder: Arc<dyn Embedder> = client;

    let registry = Arc::new(ProviderRegistry::new());
    let state = build_app_state(pool, llm, embedder, registry);

    spawn_poll_scheduler(state.sync.clone());

    let addr = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use pathfinder::core::Config;
use pathfinder::database::Database;
use pathfinder::features::chat::Relay;
use pathfinder::features::sessions::session_sweep_loop;
use pathfinder::gateway::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;
    config.export_openai_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting PathFinder HTTP server...");

    let database = Database::new(&config.database_path).await?;
    let relay = Relay::from_config(&config);

    // Per-user request locks live in the session store
    let sessions = relay.sessions().clone();
    let ttl = config.session_idle_ttl;
    tokio::spawn(async move {
        session_sweep_loop(sessions, ttl).await;
    });

    let app = create_router(AppState {
        relay,
        history: Arc::new(database),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

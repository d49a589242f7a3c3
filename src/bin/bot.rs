use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info};
use serenity::prelude::*;
use std::time::Duration;

use pathfinder::core::Config;
use pathfinder::features::chat::Relay;
use pathfinder::features::rate_limiting::RateLimiter;
use pathfinder::features::sessions::session_sweep_loop;
use pathfinder::gateway::Handler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::for_gateway()?;
    config.export_openai_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting PathFinder Discord Bot...");

    let relay = Relay::from_config(&config);
    let rate_limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);

    // Evict idle sessions
    let sessions = relay.sessions().clone();
    let ttl = config.session_idle_ttl;
    tokio::spawn(async move {
        session_sweep_loop(sessions, ttl).await;
    });

    // Forget users whose rate limit window has passed
    let cleanup_limiter = rate_limiter.clone();
    let cleanup_every = config.rate_limit_window.max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            let removed = cleanup_limiter.cleanup();
            debug!("🧹 Rate limiter cleanup removed {removed} idle user(s)");
        }
    });

    let handler = Handler::new(relay, rate_limiter);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.as_deref().unwrap_or_default();
    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}

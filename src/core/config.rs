//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Session history cap, idle TTL and rate limit settings
//! - 1.0.0: Initial release with token, API key and model settings

use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DATABASE_PATH: &str = "pathfinder.db";

#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token; only the gateway binary requires it
    pub discord_token: Option<String>,
    pub openai_api_key: String,
    /// Override for OpenAI-compatible endpoints
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub classifier_model: String,
    pub request_timeout: Duration,
    pub max_history_turns: usize,
    pub session_idle_ttl: Duration,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
    pub database_path: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    /// Configuration for the Discord gateway binary. Fails without a bot token.
    pub fn for_gateway() -> Result<Self> {
        Self::gateway_from_lookup(|key| env::var(key).ok())
    }

    /// Gateway configuration from an arbitrary variable source.
    pub fn gateway_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::from_lookup(lookup)?;
        if config.discord_token.is_none() {
            return Err(anyhow!("DISCORD_TOKEN must be set"));
        }
        Ok(config)
    }

    /// Configuration for the HTTP server binary.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| anyhow!("OPENAI_API_KEY must be set"))?;
        let chat_model = get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let classifier_model = get("CLASSIFIER_MODEL").unwrap_or_else(|| chat_model.clone());

        Ok(Config {
            discord_token: get("DISCORD_TOKEN"),
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            chat_model,
            classifier_model,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 45)?),
            max_history_turns: parse_or(&get, "MAX_HISTORY_TURNS", 40)?,
            session_idle_ttl: Duration::from_secs(parse_or(&get, "SESSION_IDLE_TTL_SECS", 86_400)?),
            rate_limit_max_requests: parse_or(&get, "RATE_LIMIT_MAX_REQUESTS", 10)?,
            rate_limit_window: Duration::from_secs(parse_or(&get, "RATE_LIMIT_WINDOW_SECS", 60)?),
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            port: parse_or(&get, "PORT", 3000)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl Config {
    /// The openai crate reads credentials from the process environment, not
    /// from this struct. Call once at startup before any task is spawned.
    pub fn export_openai_env(&self) {
        env::set_var("OPENAI_API_KEY", &self.openai_api_key);
        env::set_var("OPENAI_KEY", &self.openai_api_key);
        if let Some(base_url) = &self.openai_base_url {
            env::set_var("OPENAI_BASE_URL", base_url);
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

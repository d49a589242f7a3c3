//! Discord event handling
//!
//! Bots are ignored. In guild channels the bot only answers when mentioned;
//! direct messages are always answered.

use crate::core::{MessageSink, MESSAGE_LIMIT};
use crate::features::chat::{Outcome, Relay};
use crate::features::rate_limiting::{RateLimiter, SLOW_DOWN_MESSAGE};
use anyhow::Result;
use log::{debug, error, info, warn};
use regex::Regex;
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use std::sync::{Arc, OnceLock};

static MENTION_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Remove user mention markup (`<@id>` and `<@!id>`) and surrounding whitespace
pub fn strip_mentions(content: &str) -> String {
    let pattern = MENTION_PATTERN.get_or_init(|| {
        Regex::new(r"<@!?\d+>").expect("mention pattern is valid")
    });
    pattern.replace_all(content, "").trim().to_string()
}

/// Whether a message should reach the relay at all
fn should_respond(author_is_bot: bool, is_dm: bool, mentions_bot: bool) -> bool {
    !author_is_bot && (is_dm || mentions_bot)
}

/// `MessageSink` that posts into one Discord channel
pub struct ChannelSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    fn max_message_len(&self) -> Option<usize> {
        Some(MESSAGE_LIMIT)
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.channel_id.say(&self.http, text).await?;
        Ok(())
    }

    async fn typing(&self) -> Result<()> {
        self.channel_id.broadcast_typing(&self.http).await?;
        Ok(())
    }
}

pub struct Handler {
    relay: Relay,
    rate_limiter: RateLimiter,
}

impl Handler {
    pub fn new(relay: Relay, rate_limiter: RateLimiter) -> Self {
        Self { relay, rate_limiter }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let is_dm = msg.guild_id.is_none();
        let mentions_bot = msg.mentions_user_id(ctx.cache.current_user_id());
        if !should_respond(msg.author.bot, is_dm, mentions_bot) {
            return;
        }

        let user_id = msg.author.id.to_string();
        debug!(
            "📥 Message received | User: {} | Channel: {} | DM: {} | Content: '{}'",
            user_id,
            msg.channel_id,
            is_dm,
            msg.content.chars().take(100).collect::<String>()
        );

        if !self.rate_limiter.check_rate_limit(&user_id) {
            warn!(
                "🚫 Rate limit exceeded for user: {user_id} (retry in {:?})",
                self.rate_limiter.retry_after(&user_id)
            );
            if let Err(why) = msg.channel_id.say(&ctx.http, SLOW_DOWN_MESSAGE).await {
                error!("Failed to send rate limit message: {why}");
            }
            return;
        }

        let text = strip_mentions(&msg.content);
        let sink = ChannelSink::new(ctx.http.clone(), msg.channel_id);
        if let Outcome::Apologized = self.relay.handle_message(&user_id, &text, &sink).await {
            warn!("⚠️ User {user_id} received an apology instead of a reply");
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }
    }
}

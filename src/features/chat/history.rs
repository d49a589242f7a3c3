//! Persistence boundary for server-held conversation history

use crate::core::ConversationTurn;
use anyhow::Result;
use async_trait::async_trait;

/// Durable per-user conversation log. Turns are returned oldest first and
/// are never pruned.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn fetch_history(&self, user_id: &str) -> Result<Vec<ConversationTurn>>;

    /// Append `turns` atomically, in order.
    async fn save_turns(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()>;
}

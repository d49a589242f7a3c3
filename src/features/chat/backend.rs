//! Generative-text backend boundary
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Extracted the OpenAI chat completion call behind `ChatBackend`

use crate::core::{ConversationTurn, Role};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// One call to the generative service.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// System instruction, if any
    pub system: Option<String>,
    /// Prior turns, oldest first
    pub turns: Vec<ConversationTurn>,
    /// The newest user message
    pub prompt: String,
}

impl ChatRequest {
    /// A one-shot request with no instruction and no history.
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply>;
}

/// `ChatBackend` over the OpenAI chat completion API (or any compatible
/// endpoint selected through `OPENAI_BASE_URL`).
#[derive(Debug, Clone)]
pub struct OpenAiChatBackend {
    model: String,
    request_timeout: Duration,
}

impl OpenAiChatBackend {
    pub fn new(model: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            model: model.into(),
            request_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages(request: &ChatRequest) -> Vec<ChatCompletionMessage> {
        let mut messages = Vec::with_capacity(request.turns.len() + 2);

        if let Some(system) = &request.system {
            messages.push(message(ChatCompletionMessageRole::System, system));
        }

        for turn in &request.turns {
            let role = match turn.role {
                Role::User => ChatCompletionMessageRole::User,
                Role::Assistant => ChatCompletionMessageRole::Assistant,
            };
            messages.push(message(role, &turn.text));
        }

        messages.push(message(ChatCompletionMessageRole::User, &request.prompt));
        messages
    }
}

fn message(role: ChatCompletionMessageRole, content: &str) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Some(content.to_string()),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply> {
        let start_time = Instant::now();
        let messages = Self::build_messages(&request);
        debug!(
            "🔨 Built {} chat messages for model {} (history: {})",
            messages.len(),
            self.model,
            request.turns.len()
        );

        let chat_completion_future = ChatCompletion::builder(&self.model, messages).create();
        let chat_completion = timeout(self.request_timeout, chat_completion_future)
            .await
            .map_err(|_| {
                let elapsed = start_time.elapsed();
                error!("⏱️ Chat completion timed out after {elapsed:?}");
                anyhow!(
                    "chat completion timed out after {} seconds",
                    self.request_timeout.as_secs()
                )
            })?
            .map_err(|e| {
                let elapsed = start_time.elapsed();
                error!("❌ Chat completion error after {elapsed:?}: {e}");
                anyhow!("chat completion error: {}", e)
            })?;

        info!("✅ Chat completion received after {:?}", start_time.elapsed());

        let usage = chat_completion.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let text = chat_completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("no content in chat completion response"))?;

        Ok(ChatReply { text, usage })
    }
}

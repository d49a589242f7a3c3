//! # Feature: Relay Orchestration
//!
//! Runs one unit of work end to end: greeting or classification, persona
//! selection, session lookup, reply generation and delivery.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: HTTP entry points with persisted and client-held history
//! - 1.0.0: Initial release for the Discord gateway

use super::backend::OpenAiChatBackend;
use super::generator::ReplyGenerator;
use super::history::HistoryStore;
use crate::core::{deliver, Config, ConversationTurn, MessageSink, RelayError};
use crate::features::greetings;
use crate::features::language::LanguageClassifier;
use crate::features::personas::PersonaManager;
use crate::features::sessions::{SessionEvent, SessionStore};
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// How a gateway message was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Greeted,
    Replied { messages: usize },
    Apologized,
}

#[derive(Clone)]
pub struct Relay {
    classifier: LanguageClassifier,
    generator: ReplyGenerator,
    sessions: SessionStore,
}

impl Relay {
    pub fn new(classifier: LanguageClassifier, generator: ReplyGenerator, sessions: SessionStore) -> Self {
        Self {
            classifier,
            generator,
            sessions,
        }
    }

    /// Wire the OpenAI-backed classifier and generator from `config`.
    pub fn from_config(config: &Config) -> Self {
        let chat_backend = Arc::new(OpenAiChatBackend::new(&config.chat_model, config.request_timeout));
        let classifier_backend = Arc::new(OpenAiChatBackend::new(
            &config.classifier_model,
            config.request_timeout,
        ));
        info!(
            "🧠 Chat model: {} | Classifier model: {}",
            chat_backend.model(),
            classifier_backend.model()
        );

        let persona_manager = PersonaManager::new();
        for persona in persona_manager.list_personas() {
            info!("🎭 Loaded persona {} ({}): {}", persona.name, persona.language, persona.description);
        }

        Self::new(
            LanguageClassifier::new(classifier_backend),
            ReplyGenerator::new(chat_backend, persona_manager),
            SessionStore::new(config.max_history_turns),
        )
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Answer a chat-gateway message whose mention markup is already stripped.
    ///
    /// Never returns an error: failures are logged and answered with the
    /// fixed apology.
    pub async fn handle_message(&self, user_key: &str, text: &str, sink: &dyn MessageSink) -> Outcome {
        let request_id = Uuid::new_v4();
        let text = text.trim();

        if text.is_empty() {
            debug!("[{request_id}] 👋 Empty message from {user_key}, sending greeting");
            if let Err(e) = sink.send(greetings::pick()).await {
                error!("[{request_id}] ❌ Failed to send greeting: {e}");
            }
            return Outcome::Greeted;
        }

        match self.reply_in_session(request_id, user_key, text, sink).await {
            Ok(messages) => {
                info!("[{request_id}] ✅ Reply delivered in {messages} message(s)");
                Outcome::Replied { messages }
            }
            Err(e) => {
                error!("[{request_id}] ❌ An error occurred while handling message from {user_key}: {e}");
                if let Err(why) = sink.send(e.user_message()).await {
                    error!("[{request_id}] ❌ Failed to send apology: {why}");
                }
                Outcome::Apologized
            }
        }
    }

    async fn reply_in_session(
        &self,
        request_id: Uuid,
        user_key: &str,
        text: &str,
        sink: &dyn MessageSink,
    ) -> Result<usize, RelayError> {
        if let Err(e) = sink.typing().await {
            warn!("[{request_id}] ⚠️ Typing indicator failed: {e}");
        }

        let language = self.classifier.classify(text).await;

        let mut guard = self.sessions.acquire(user_key).await;
        let (session, event) = guard.get_or_create(language);
        match event {
            SessionEvent::Created => info!(
                "[{request_id}] 🆕 Starting new '{language}' chat session {} for user {user_key}",
                session.id
            ),
            SessionEvent::Reset {
                previous,
                discarded_turns,
            } => info!(
                "[{request_id}] 🔄 Language switched {previous} → {language} for user {user_key}, \
                 discarded {discarded_turns} turn(s); new session {} at {}",
                session.id,
                session.created_at.to_rfc3339()
            ),
            SessionEvent::Continue => debug!(
                "[{request_id}] 📚 Continuing session {} ({} turn(s))",
                session.id,
                session.history().len()
            ),
        }

        let reply = self.generator.generate(session, text).await?;
        drop(guard);

        deliver(sink, &reply).await.map_err(RelayError::Delivery)
    }

    /// Answer an HTTP prompt using history persisted under `user_id`.
    ///
    /// History is reloaded in full regardless of the detected language; the
    /// language only selects the system instruction.
    pub async fn handle_persisted_prompt(
        &self,
        history_store: &dyn HistoryStore,
        user_id: &str,
        prompt: &str,
    ) -> Result<String, RelayError> {
        let request_id = Uuid::new_v4();
        let (user_id, prompt) = (user_id.trim(), prompt.trim());
        if user_id.is_empty() || prompt.is_empty() {
            return Err(RelayError::MissingInput("userId and prompt are required"));
        }

        // Same-user requests are serialized so stored turns stay paired
        let _guard = self.sessions.acquire(user_id).await;

        let history = history_store
            .fetch_history(user_id)
            .await
            .map_err(RelayError::Persistence)?;
        info!("[{request_id}] 📚 Retrieved {} historical messages for {user_id}", history.len());

        let language = self.classifier.classify(prompt).await;
        let reply = self.generator.generate_with_history(language, &history, prompt).await?;

        history_store
            .save_turns(
                user_id,
                &[ConversationTurn::user(prompt), ConversationTurn::assistant(reply.clone())],
            )
            .await
            .map_err(RelayError::Persistence)?;

        info!("[{request_id}] ✅ Reply generated ({} chars, {language})", reply.chars().count());
        Ok(reply)
    }

    /// Answer an HTTP prompt with history supplied by the client. Nothing is stored.
    pub async fn handle_stateless_prompt(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<String, RelayError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(RelayError::MissingInput("userId and prompt are required"));
        }

        let language = self.classifier.classify(prompt).await;
        self.generator.generate_with_history(language, history, prompt).await
    }
}

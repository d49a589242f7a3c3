//! # Feature: Reply Generation
//!
//! Sends the persona instruction, prior turns and the new message to the chat
//! backend. The session-backed variant records the exchange only once the
//! backend has answered.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use super::backend::{ChatBackend, ChatRequest};
use crate::core::{ConversationTurn, RelayError};
use crate::features::personas::{Language, PersonaManager};
use crate::features::sessions::Session;
use log::debug;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReplyGenerator {
    backend: Arc<dyn ChatBackend>,
    persona_manager: PersonaManager,
}

impl ReplyGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, persona_manager: PersonaManager) -> Self {
        Self {
            backend,
            persona_manager,
        }
    }

    /// Generate a reply in `language` on top of externally held `history`.
    /// Nothing is recorded.
    pub async fn generate_with_history(
        &self,
        language: Language,
        history: &[ConversationTurn],
        user_text: &str,
    ) -> Result<String, RelayError> {
        let persona = self.persona_manager.get_persona(language);
        debug!("🎭 Replying as {} with {} prior turn(s)", persona.name, history.len());
        let request = ChatRequest {
            system: Some(self.persona_manager.get_system_prompt(language).to_string()),
            turns: history.to_vec(),
            prompt: user_text.to_string(),
        };

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(RelayError::Generation)?;

        if let Some(usage) = reply.usage {
            debug!(
                "📊 Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        if reply.text.trim().is_empty() {
            return Err(RelayError::Generation(anyhow::anyhow!("backend returned an empty reply")));
        }

        Ok(reply.text)
    }

    /// Generate a reply for `session` and append the user turn and the reply
    /// to its history. On failure the history is left untouched.
    pub async fn generate(&self, session: &mut Session, user_text: &str) -> Result<String, RelayError> {
        let reply = self
            .generate_with_history(session.language(), session.history(), user_text)
            .await?;

        session.append(ConversationTurn::user(user_text));
        session.append(ConversationTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::features::chat::ChatReply;
    use crate::features::sessions::SessionStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the prompt back, or fails when `fail` is set
    struct EchoBackend {
        fail: bool,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl EchoBackend {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn complete(&self, request: ChatRequest) -> Result<ChatReply> {
            let text = format!("echo: {}", request.prompt);
            self.requests.lock().unwrap().push(request);
            if self.fail {
                anyhow::bail!("chat completion timed out after 45 seconds");
            }
            Ok(ChatReply { text, usage: None })
        }
    }

    #[tokio::test]
    async fn test_generate_appends_exchange_in_order() {
        let backend = EchoBackend::new(false);
        let generator = ReplyGenerator::new(backend.clone(), PersonaManager::new());
        let store = SessionStore::new(40);
        let mut guard = store.acquire("user1").await;
        let (session, _) = guard.get_or_create(Language::English);

        let reply = generator.generate(session, "what is rust").await.unwrap();

        assert_eq!(reply, "echo: what is rust");
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "what is rust");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "echo: what is rust");
    }

    #[tokio::test]
    async fn test_second_call_sends_first_exchange() {
        let backend = EchoBackend::new(false);
        let generator = ReplyGenerator::new(backend.clone(), PersonaManager::new());
        let store = SessionStore::new(40);
        let mut guard = store.acquire("user1").await;
        let (session, _) = guard.get_or_create(Language::English);

        generator.generate(session, "first").await.unwrap();
        generator.generate(session, "second").await.unwrap();

        let requests = backend.requests.lock().unwrap();
        let second = &requests[1];
        let texts: Vec<&str> = second.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "echo: first"]);
        assert_eq!(second.prompt, "second");
    }

    #[tokio::test]
    async fn test_failure_leaves_history_untouched() {
        let backend = EchoBackend::new(true);
        let generator = ReplyGenerator::new(backend, PersonaManager::new());
        let store = SessionStore::new(40);
        let mut guard = store.acquire("user1").await;
        let (session, _) = guard.get_or_create(Language::English);
        session.append(ConversationTurn::user("earlier"));
        session.append(ConversationTurn::assistant("reply"));

        let result = generator.generate(session, "boom").await;

        assert!(matches!(result, Err(RelayError::Generation(_))));
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_system_prompt_follows_language() {
        let backend = EchoBackend::new(false);
        let personas = PersonaManager::new();
        let generator = ReplyGenerator::new(backend.clone(), personas.clone());

        generator
            .generate_with_history(Language::Hinglish, &[], "kya haal hai")
            .await
            .unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(
            requests[0].system.as_deref(),
            Some(personas.get_system_prompt(Language::Hinglish))
        );
        assert!(requests[0].turns.is_empty());
    }
}

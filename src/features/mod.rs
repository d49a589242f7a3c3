//! # Features Module
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Relay pipeline features: language, personas, sessions, chat, greetings
//! - 1.0.0: Initial feature layout

pub mod chat;
pub mod greetings;
pub mod language;
pub mod personas;
pub mod rate_limiting;
pub mod sessions;

pub use chat::{
    ChatBackend, ChatReply, ChatRequest, HistoryStore, OpenAiChatBackend, Outcome, Relay, ReplyGenerator,
    TokenUsage,
};
pub use language::LanguageClassifier;
pub use personas::{Language, Persona, PersonaManager};
pub use rate_limiting::{RateLimiter, SLOW_DOWN_MESSAGE};
pub use sessions::{session_sweep_loop, Session, SessionEvent, SessionStore};

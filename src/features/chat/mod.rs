//! # Chat Feature
//!
//! Generative backend, reply generation, history persistence boundary and
//! the relay that ties them together.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod backend;
pub mod generator;
pub mod history;
pub mod relay;

pub use backend::{ChatBackend, ChatReply, ChatRequest, OpenAiChatBackend, TokenUsage};
pub use generator::ReplyGenerator;
pub use history::HistoryStore;
pub use relay::{Outcome, Relay};

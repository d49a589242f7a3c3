//! # Core Module
//!
//! Core types, configuration, and error handling for the relay.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add error module with the relay error taxonomy and shared conversation turns
//! - 1.1.0: Add response module with message chunking and ordered delivery
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod conversation;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use conversation::{ConversationTurn, Role};
pub use error::{RelayError, APOLOGY_MESSAGE, HTTP_FAILURE_MESSAGE};
pub use response::{chunk_text, deliver, MessageSink, MESSAGE_LIMIT};

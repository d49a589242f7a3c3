//! # Gateway Module
//!
//! Transport surfaces in front of the relay: the Discord event handler and
//! the HTTP chat server.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: HTTP surface with `/chat` and `/health`
//! - 1.0.0: Discord gateway handler

pub mod discord;
pub mod http;

pub use discord::{strip_mentions, ChannelSink, Handler};
pub use http::{create_router, AppState};

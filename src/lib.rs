// Core layer - shared types and configuration
pub mod core;

// Features layer - relay pipeline
pub mod features;

// Transport surfaces
pub mod gateway;

// Infrastructure
pub mod database;

pub use core::{Config, RelayError};
pub use database::Database;
pub use features::{Language, PersonaManager, Relay, SessionStore};

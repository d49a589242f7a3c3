//! # Personas Feature
//!
//! English and Hinglish reply personas.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Personas keyed by `Language`
//! - 1.0.0: Initial release

pub mod manager;

pub use manager::{Language, Persona, PersonaManager};

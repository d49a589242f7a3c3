//! # Language Feature
//!
//! Detects whether a message is English or Hinglish.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod classifier;

pub use classifier::{parse_label, LanguageClassifier};

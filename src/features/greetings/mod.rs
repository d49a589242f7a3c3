//! # Greetings Feature
//!
//! Random greeting for messages that mention the bot without saying anything.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use rand::seq::IndexedRandom;

pub const GREETINGS: &[&str] = &[
    "Hello! How can I help you today? ✨",
    "Greetings! I'm ready to assist. What's your question?",
    "I'm here to help. What problem can we solve?",
    "Namaste! Main aapki kaise madad kar sakta hoon?",
    "Hey there! Ask me anything.",
];

/// Uniformly pick one greeting
pub fn pick() -> &'static str {
    GREETINGS.choose(&mut rand::rng()).copied().unwrap_or(GREETINGS[0])
}

//! # Feature: Language Classification
//!
//! Asks the generative service which language a message is written in and
//! maps the free-text answer onto the closed `Language` set.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Few-shot examples in the detection prompt
//! - 1.0.0: Initial release

use crate::features::chat::{ChatBackend, ChatRequest};
use crate::features::personas::Language;
use log::{info, warn};
use std::sync::Arc;

/// Substring that marks a classifier answer as the secondary language
const HINGLISH_KEYWORD: &str = "hinglish";

#[derive(Clone)]
pub struct LanguageClassifier {
    backend: Arc<dyn ChatBackend>,
}

impl LanguageClassifier {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Classify `text`. Never fails: any backend error yields `Language::English`.
    pub async fn classify(&self, text: &str) -> Language {
        match self.backend.complete(ChatRequest::single(detection_prompt(text))).await {
            Ok(reply) => {
                let answer = reply.text.trim().to_lowercase();
                info!("🌐 Detected language: {answer}");
                parse_label(&answer)
            }
            Err(e) => {
                warn!("⚠️ Language detection failed, defaulting to english: {e}");
                Language::default()
            }
        }
    }
}

/// Map a classifier answer to a label. Anything without the Hinglish keyword,
/// including an empty answer, is English.
pub fn parse_label(answer: &str) -> Language {
    if answer.to_lowercase().contains(HINGLISH_KEYWORD) {
        Language::Hinglish
    } else {
        Language::English
    }
}

fn detection_prompt(text: &str) -> String {
    format!(
        r#"You are an expert language identifier. Given the following text, identify if it's primarily English or Hinglish.
Respond with only a single word: 'English' or 'Hinglish'.

---
EXAMPLES:
Text: "how to learn python"
Language: English

Text: "cricket match kab hai"
Language: Hinglish

Text: "aur btao"
Language: Hinglish
---

TASK:
Text: "{text}"
Language:"#
    )
}

//! # Feature: Persona System
//!
//! Language personas for replies. Each persona binds a language label to a
//! system prompt loaded from prompt/*.md files at compile time.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Closed `Language` label set replaces free-form persona ids
//! - 1.0.0: Initial release

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply language. `English` is the primary language and the fallback for
/// anything the classifier cannot place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    /// Hindi written in Latin script, mixed with English
    Hinglish,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hinglish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hinglish => "hinglish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub language: Language,
    pub name: String,
    pub system_prompt: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct PersonaManager {
    english: Persona,
    hinglish: Persona,
}

impl Default for PersonaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaManager {
    pub fn new() -> Self {
        PersonaManager {
            english: Persona {
                language: Language::English,
                name: "PathFinder".to_string(),
                system_prompt: include_str!("../../../prompt/english.md").to_string(),
                description: "Clear, structured answers in English".to_string(),
            },
            hinglish: Persona {
                language: Language::Hinglish,
                name: "PathFinder (Hinglish)".to_string(),
                system_prompt: include_str!("../../../prompt/hinglish.md").to_string(),
                description: "Saaf aur sateek jawaab, Hinglish mein".to_string(),
            },
        }
    }

    pub fn get_persona(&self, language: Language) -> &Persona {
        match language {
            Language::English => &self.english,
            Language::Hinglish => &self.hinglish,
        }
    }

    pub fn list_personas(&self) -> Vec<&Persona> {
        Language::ALL.iter().map(|l| self.get_persona(*l)).collect()
    }

    pub fn get_system_prompt(&self, language: Language) -> &str {
        &self.get_persona(language).system_prompt
    }
}

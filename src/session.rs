use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::formatter::RenderedOutcome;
use crate::language::{detect_language, Language};
use crate::navigator::Navigator;
use crate::outcome::ClassificationOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatTurn {
    User {
        timestamp: String,
        text: String,
        language: Language,
    },
    Assistant {
        timestamp: String,
        outcome: ClassificationOutcome,
        language: Language,
    },
}

impl ChatTurn {
    pub fn language(&self) -> Language {
        match self {
            ChatTurn::User { language, .. } | ChatTurn::Assistant { language, .. } => *language,
        }
    }
}

/// In-memory history of one chat session. Nothing is persisted, and earlier
/// turns are never sent back to the model.
#[derive(Debug)]
pub struct ChatSession {
    pub id: Uuid,
    pub turns: Vec<ChatTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    pub fn add_user_turn(&mut self, text: String) -> Language {
        let language = detect_language(&text);
        self.turns.push(ChatTurn::User {
            timestamp: now(),
            text,
            language,
        });
        language
    }

    pub fn add_assistant_turn(&mut self, outcome: ClassificationOutcome, language: Language) {
        self.turns.push(ChatTurn::Assistant {
            timestamp: now(),
            outcome,
            language,
        });
    }

    /// Record the query, classify it, and record the answer. Returns the
    /// language the answer should be rendered in.
    pub async fn submit(&mut self, navigator: &Navigator, query: &str) -> Language {
        let language = self.add_user_turn(query.to_string());
        let outcome = navigator.classify(query).await;
        self.add_assistant_turn(outcome, language);
        language
    }

    pub fn last_outcome(&self) -> Option<&ClassificationOutcome> {
        self.turns.iter().rev().find_map(|turn| match turn {
            ChatTurn::Assistant { outcome, .. } => Some(outcome),
            ChatTurn::User { .. } => None,
        })
    }

    /// Expand every assistant turn for display. `language` overrides the
    /// language each turn was answered in.
    pub fn render_history(
        &self,
        navigator: &Navigator,
        language: Option<Language>,
    ) -> Vec<(usize, RenderedOutcome)> {
        self.turns
            .iter()
            .enumerate()
            .filter_map(|(i, turn)| match turn {
                ChatTurn::Assistant {
                    outcome,
                    language: answered_in,
                    ..
                } => Some((i, navigator.format_for(outcome, language.unwrap_or(*answered_in)))),
                ChatTurn::User { .. } => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

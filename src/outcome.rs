use serde::{Deserialize, Serialize};

/// Result of classifying one user query.
///
/// Build service outcomes through [`ClassificationOutcome::from_keys`] so a
/// single key is always `Service` and `MultiService` always holds two or more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    Service { key: String },
    MultiService { keys: Vec<String> },
    Conversation { message: String },
}

impl ClassificationOutcome {
    /// `None` for an empty list. Callers pass keys already deduplicated.
    pub fn from_keys(mut keys: Vec<String>) -> Option<Self> {
        match keys.len() {
            0 => None,
            1 => keys.pop().map(|key| ClassificationOutcome::Service { key }),
            _ => Some(ClassificationOutcome::MultiService { keys }),
        }
    }

    pub fn conversation(message: impl Into<String>) -> Self {
        ClassificationOutcome::Conversation {
            message: message.into(),
        }
    }

    /// Resolved service keys, in order. Empty for a conversation.
    pub fn service_keys(&self) -> Vec<&str> {
        match self {
            ClassificationOutcome::Service { key } => vec![key.as_str()],
            ClassificationOutcome::MultiService { keys } => keys.iter().map(String::as_str).collect(),
            ClassificationOutcome::Conversation { .. } => Vec::new(),
        }
    }

    pub fn is_conversation(&self) -> bool {
        matches!(self, ClassificationOutcome::Conversation { .. })
    }
}

//! Conversation context consumed by the router and the orchestrator
//!
//! The context arrives already trimmed by an external context manager; this
//! module only slices the most recent messages out of it.

use serde::{Deserialize, Serialize};

/// Messages examined by context enhancement (last three turns)
pub const ENHANCEMENT_WINDOW: usize = 6;

/// Messages folded into the classification cache key
pub const CACHE_KEY_WINDOW: usize = 4;

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The last `window` messages, oldest first
pub fn recent(context: &[ConversationTurn], window: usize) -> &[ConversationTurn] {
    let start = context.len().saturating_sub(window);
    &context[start..]
}

/// Contents of the last `window` messages joined by newlines
pub fn recent_text(context: &[ConversationTurn], window: usize) -> String {
    recent(context, window)
        .iter()
        .map(|turn| turn.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

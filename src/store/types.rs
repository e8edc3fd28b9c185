//! Persisted conversation data model
//!
//! Serde field and variant names intentionally match the JSON blob written
//! by earlier clients of the answer server (`id`/`title`/`messages`,
//! `sender`/`content`, lowercase sender values), so an existing history
//! round-trips unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Originator of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person asking questions
    User,
    /// The answer server
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message within a chat session
///
/// Messages are immutable once created and appended in strict
/// (user, assistant) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message
    pub sender: Sender,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Creates a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: content.into(),
        }
    }
}

/// One logical conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Opaque session identifier
    pub id: String,
    /// Title derived from the first question
    pub title: String,
    /// Ordered message list
    pub messages: Vec<ChatMessage>,
}

//! Chat message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles and the message record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emotion tag used when the generator did not classify the message.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

impl MessageRole {
    /// Wire representation of the role (the backend's `rol` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
///
/// `id`, `role` and `timestamp` never change after creation. There is no
/// edit operation, so `text` and `emotion` are immutable too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Locally generated unique identifier (UUID v4).
    pub id: String,
    /// The content of the message.
    pub text: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// Timestamp when the message was created (client clock).
    pub timestamp: DateTime<Utc>,
    /// Emotion classification attached by the reply generator.
    pub emotion: String,
}

impl ChatMessage {
    /// Creates a message with an explicit timestamp.
    ///
    /// Used when mapping messages loaded from the backend, which carry their
    /// own recorded timestamps.
    pub fn new(
        role: MessageRole,
        text: impl Into<String>,
        emotion: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            role,
            timestamp,
            emotion: emotion.unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
        }
    }

    /// Creates a user message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text, None, Utc::now())
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(text: impl Into<String>, emotion: Option<String>) -> Self {
        Self::new(MessageRole::Assistant, text, emotion, Utc::now())
    }
}

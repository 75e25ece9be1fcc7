//! Conversation domain model.

use super::message::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted conversation as returned by the history service.
///
/// This is the shape `resume` consumes: the server-assigned id, the full
/// message list in server-declared order, and the creation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Server-assigned conversation identifier.
    pub id: String,
    /// Messages in server-declared order.
    pub messages: Vec<ChatMessage>,
    /// Timestamp when the conversation was created.
    pub created_at: DateTime<Utc>,
}

/// One user message plus the assistant reply it provoked.
///
/// An exchange is the atomic unit for persistence and rollback: either both
/// messages are saved and stay visible, or neither does.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// The user's message.
    pub user: ChatMessage,
    /// The assistant's reply.
    pub assistant: ChatMessage,
}

//! Ordered message store for the active session.
//!
//! The store holds the append-only message list and supports the two-phase
//! optimistic append used by `send_exchange`: messages are staged first and
//! either committed once the backend accepted them or reverted as a unit.

use super::message::ChatMessage;

/// Handle for an optimistically appended exchange.
///
/// Returned by [`MessageStore::stage`]; the staged messages stay visible in
/// the store until the handle is passed back to [`MessageStore::commit`] or
/// [`MessageStore::revert`]. Reverting removes exactly the staged messages,
/// even if other exchanges appended in between.
#[must_use = "staged messages must be committed or reverted"]
#[derive(Debug)]
pub struct StagedExchange {
    ids: Vec<String>,
}

impl StagedExchange {
    /// Ids of the messages staged under this handle.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Ordered, append-only list of messages for the active session.
///
/// Insertion order is chat order. The store preserves whatever order it is
/// given; sorting for display is a presentation concern.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the end.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replaces the whole content with `messages`, preserving their order.
    ///
    /// Used only when loading a historical conversation.
    pub fn replace_all(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns an owned copy of the current sequence.
    ///
    /// Callers never observe in-place mutation through a snapshot.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Optimistically appends `message` and opens a staged exchange.
    pub fn stage(&mut self, message: ChatMessage) -> StagedExchange {
        let staged = StagedExchange {
            ids: vec![message.id.clone()],
        };
        self.messages.push(message);
        staged
    }

    /// Optimistically appends `message` under an already open handle.
    pub fn stage_more(&mut self, staged: &mut StagedExchange, message: ChatMessage) {
        staged.ids.push(message.id.clone());
        self.messages.push(message);
    }

    /// Finalizes a staged exchange; the messages stay in the store.
    pub fn commit(&mut self, staged: StagedExchange) {
        drop(staged);
    }

    /// Removes exactly the messages staged under `staged`.
    pub fn revert(&mut self, staged: StagedExchange) {
        self.messages.retain(|m| !staged.ids.contains(&m.id));
    }
}

//! Conversation backend traits.
//!
//! Defines the interfaces for conversation persistence and history
//! retrieval, decoupling the session core from the transport (the production
//! implementation talks GraphQL over HTTP, tests use in-memory fakes).

use super::message::ChatMessage;
use super::model::ConversationSummary;
use crate::auth::Credential;
use crate::error::Result;
use async_trait::async_trait;

/// Receipt for a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Id of the conversation the batch was appended to. For a save issued
    /// with `conversation_id = None` this is the newly created id.
    pub conversation_id: String,
}

/// Persists message batches against the remote conversation store.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Appends `batch` to the conversation identified by `conversation_id`,
    /// or creates a new conversation when it is `None`.
    ///
    /// # Returns
    ///
    /// - `Ok(receipt)`: The batch was persisted; the receipt carries the
    ///   (possibly new) conversation id
    /// - `Err(_)`: Auth failure, network failure, or malformed response
    ///   (e.g. no conversation id where one was expected)
    async fn save_messages(
        &self,
        batch: &[ChatMessage],
        conversation_id: Option<&str>,
        credential: &Credential,
    ) -> Result<SaveReceipt>;
}

/// Retrieves previously persisted conversations.
#[async_trait]
pub trait ConversationHistory: Send + Sync {
    /// Lists the user's conversations, most recent first.
    async fn list(&self, credential: &Credential) -> Result<Vec<ConversationSummary>>;

    /// Fetches a single conversation by id.
    ///
    /// # Returns
    ///
    /// - `Ok(conversation)`: Conversation found
    /// - `Err(BrakeError::NotFound { .. })`: No conversation with that id
    /// - `Err(_)`: Error occurred during retrieval
    async fn fetch(
        &self,
        conversation_id: &str,
        credential: &Credential,
    ) -> Result<ConversationSummary>;
}

//! Reply generation collaborator contract.

use crate::error::Result;
use async_trait::async_trait;

/// A reply produced by the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    /// The generated reply text.
    pub text: String,
    /// Emotion the service detected in the user's message, if any.
    pub emotion: Option<String>,
}

/// Produces an assistant reply for a user message.
///
/// Implementations call the remote text-generation endpoint; failures
/// (timeout, non-2xx, malformed body) surface as
/// [`BrakeError::Generation`](crate::BrakeError::Generation).
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generates a reply for `text`.
    async fn generate(&self, text: &str) -> Result<GeneratedReply>;
}

//! Remote conversation identity.
//!
//! Tracks whether the active session already has a server-assigned
//! conversation id and mirrors that id into the durable pointer so a
//! restart continues the same remote conversation instead of silently
//! forking a new one.

use crate::error::Result;
use crate::storage::{KeyValueStore, keys};
use std::sync::Arc;

/// The active session's remote identity.
///
/// Invariant: `is_new() == conversation_id().is_none()` after every
/// completed operation. A session acquires exactly one remote identity: the
/// first id a save returns is canonical for the session's lifetime.
pub struct ConversationIdentity {
    conversation_id: Option<String>,
    is_new: bool,
    pointer: Arc<dyn KeyValueStore>,
}

impl ConversationIdentity {
    /// Creates a fresh identity for a not-yet-persisted session.
    ///
    /// Does not touch the durable pointer; callers that want a clean slate
    /// use [`mark_new`](Self::mark_new).
    pub fn new(pointer: Arc<dyn KeyValueStore>) -> Self {
        Self {
            conversation_id: None,
            is_new: true,
            pointer,
        }
    }

    /// Restores the identity persisted by a previous run.
    ///
    /// If the durable pointer holds a conversation id, the session starts as
    /// continuing before any messages are loaded; otherwise it starts fresh.
    pub async fn restore(pointer: Arc<dyn KeyValueStore>) -> Result<Self> {
        let stored = pointer.get(keys::ACTIVE_CONVERSATION).await?;
        Ok(Self {
            is_new: stored.is_none(),
            conversation_id: stored,
            pointer,
        })
    }

    /// Clears the remote identity and the durable pointer.
    pub async fn mark_new(&mut self) -> Result<()> {
        self.conversation_id = None;
        self.is_new = true;
        self.pointer.remove(keys::ACTIVE_CONVERSATION).await
    }

    /// Binds the session to a server-assigned conversation id.
    ///
    /// The first bound id is canonical. Binding the same id again is a
    /// no-op; binding a *different* id is a backend-contract violation that
    /// is logged and ignored, since switching would silently fork the
    /// message history.
    pub async fn bind(&mut self, conversation_id: String) -> Result<()> {
        match &self.conversation_id {
            Some(bound) if *bound != conversation_id => {
                tracing::warn!(
                    bound = %bound,
                    returned = %conversation_id,
                    "backend returned a different conversation id; keeping the bound one"
                );
                return Ok(());
            }
            Some(_) => return Ok(()),
            None => {}
        }

        self.pointer
            .set(keys::ACTIVE_CONVERSATION, &conversation_id)
            .await?;
        self.conversation_id = Some(conversation_id);
        self.is_new = false;
        Ok(())
    }

    /// The bound conversation id, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// True until the first save succeeds.
    pub fn is_new(&self) -> bool {
        self.is_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                values: Mutex::new(HashMap::new()),
            })
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn bind_writes_the_durable_pointer() {
        let store = MemoryStore::new();
        let mut identity = ConversationIdentity::new(store.clone());

        identity.bind("c1".to_string()).await.unwrap();

        assert_eq!(identity.conversation_id(), Some("c1"));
        assert!(!identity.is_new());
        assert_eq!(
            store.get(keys::ACTIVE_CONVERSATION).await.unwrap(),
            Some("c1".to_string())
        );
    }

    #[tokio::test]
    async fn second_bind_with_a_different_id_keeps_the_first() {
        let store = MemoryStore::new();
        let mut identity = ConversationIdentity::new(store.clone());

        identity.bind("c1".to_string()).await.unwrap();
        identity.bind("c2".to_string()).await.unwrap();

        assert_eq!(identity.conversation_id(), Some("c1"));
        assert_eq!(
            store.get(keys::ACTIVE_CONVERSATION).await.unwrap(),
            Some("c1".to_string())
        );
    }

    #[tokio::test]
    async fn rebinding_the_same_id_is_a_no_op() {
        let store = MemoryStore::new();
        let mut identity = ConversationIdentity::new(store.clone());

        identity.bind("c1".to_string()).await.unwrap();
        identity.bind("c1".to_string()).await.unwrap();

        assert_eq!(identity.conversation_id(), Some("c1"));
        assert!(!identity.is_new());
    }

    #[tokio::test]
    async fn mark_new_clears_identity_and_pointer() {
        let store = MemoryStore::new();
        let mut identity = ConversationIdentity::new(store.clone());
        identity.bind("c1".to_string()).await.unwrap();

        identity.mark_new().await.unwrap();

        assert_eq!(identity.conversation_id(), None);
        assert!(identity.is_new());
        assert_eq!(store.get(keys::ACTIVE_CONVERSATION).await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_continues_a_stored_conversation() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_CONVERSATION, "c9").await.unwrap();

        let identity = ConversationIdentity::restore(store).await.unwrap();

        assert_eq!(identity.conversation_id(), Some("c9"));
        assert!(!identity.is_new());
    }

    #[tokio::test]
    async fn restore_without_a_pointer_starts_fresh() {
        let store = MemoryStore::new();

        let identity = ConversationIdentity::restore(store).await.unwrap();

        assert_eq!(identity.conversation_id(), None);
        assert!(identity.is_new());
    }
}

//! Save coordinator.
//!
//! Serializes persistence of newly produced message pairs against the
//! backend: at most one in-flight save per session, queued saves run in
//! queue order, and the first save's returned id becomes the session's
//! canonical remote identity.

use super::identity::ConversationIdentity;
use super::message::ChatMessage;
use super::repository::ConversationBackend;
use crate::auth::CredentialProvider;
use crate::error::{BrakeError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Coordinates backend writes for one session.
///
/// The internal lock is a `tokio::sync::Mutex`, whose waiter queue is FIFO:
/// if save A is queued before save B, A's network call completes and its
/// identity effects apply before B's call is issued. This is what prevents
/// two saves from racing to both claim "first save, I own the new id".
pub struct SaveCoordinator {
    backend: Arc<dyn ConversationBackend>,
    credentials: Arc<dyn CredentialProvider>,
    save_lock: Mutex<()>,
}

impl SaveCoordinator {
    /// Creates a coordinator writing through `backend` with credentials
    /// supplied by `credentials`.
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            backend,
            credentials,
            save_lock: Mutex::new(()),
        }
    }

    /// Persists `batch` under the session's current identity.
    ///
    /// Waits for any in-flight save to finish before issuing its own call.
    /// A missing credential fails immediately with
    /// [`BrakeError::AuthenticationMissing`]; no network call is attempted.
    /// On success the returned conversation id is bound (first id wins).
    /// On failure identity state is untouched; the caller decides whether to
    /// roll back its optimistic appends.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is available or the backend call
    /// fails.
    pub async fn save(
        &self,
        batch: &[ChatMessage],
        identity: &mut ConversationIdentity,
    ) -> Result<()> {
        let _in_flight = self.save_lock.lock().await;

        let credential = self
            .credentials
            .credential()
            .await
            .ok_or(BrakeError::AuthenticationMissing)?;

        tracing::debug!(
            batch_len = batch.len(),
            conversation_id = ?identity.conversation_id(),
            "saving exchange"
        );

        let receipt = self
            .backend
            .save_messages(batch, identity.conversation_id(), &credential)
            .await?;

        identity.bind(receipt.conversation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credential;
    use crate::conversation::repository::SaveReceipt;
    use crate::storage::KeyValueStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MemoryStore {
        values: StdMutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                values: StdMutex::new(HashMap::new()),
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

    struct StaticCredentials {
        token: Option<&'static str>,
    }

    #[async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn credential(&self) -> Option<Credential> {
            self.token.map(Credential::new)
        }
    }

    /// Backend that records calls and asserts mutual exclusion.
    struct RecordingBackend {
        /// (first message text, conversation id the call was issued with)
        calls: StdMutex<Vec<(String, Option<String>)>>,
        /// Ids to return, one per call; empty means fail the call.
        results: StdMutex<Vec<Result<String>>>,
        in_flight: AtomicUsize,
        delay: Duration,
    }

    impl RecordingBackend {
        fn returning(ids: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: StdMutex::new(Vec::new()),
                results: StdMutex::new(ids),
                in_flight: AtomicUsize::new(0),
                delay: Duration::from_millis(5),
            })
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConversationBackend for RecordingBackend {
        async fn save_messages(
            &self,
            batch: &[ChatMessage],
            conversation_id: Option<&str>,
            _credential: &Credential,
        ) -> Result<SaveReceipt> {
            let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst);
            assert_eq!(concurrent, 0, "two saves were in flight at once");

            self.calls.lock().unwrap().push((
                batch.first().map(|m| m.text.clone()).unwrap_or_default(),
                conversation_id.map(str::to_string),
            ));
            tokio::time::sleep(self.delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                return Err(BrakeError::persistence("backend exhausted"));
            }
            results.remove(0).map(|id| SaveReceipt {
                conversation_id: id,
            })
        }
    }

    fn exchange(text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user(text),
            ChatMessage::assistant("respuesta", None),
        ]
    }

    #[tokio::test]
    async fn first_save_binds_the_returned_id() {
        let backend = RecordingBackend::returning(vec![Ok("c1".to_string())]);
        let coordinator = SaveCoordinator::new(
            backend.clone(),
            Arc::new(StaticCredentials { token: Some("t") }),
        );
        let mut identity = ConversationIdentity::new(MemoryStore::new());

        coordinator
            .save(&exchange("hola"), &mut identity)
            .await
            .unwrap();

        assert_eq!(identity.conversation_id(), Some("c1"));
        assert_eq!(backend.calls(), vec![("hola".to_string(), None)]);
    }

    #[tokio::test]
    async fn later_saves_reuse_the_bound_id() {
        let backend =
            RecordingBackend::returning(vec![Ok("c1".to_string()), Ok("c1".to_string())]);
        let coordinator = SaveCoordinator::new(
            backend.clone(),
            Arc::new(StaticCredentials { token: Some("t") }),
        );
        let mut identity = ConversationIdentity::new(MemoryStore::new());

        coordinator
            .save(&exchange("uno"), &mut identity)
            .await
            .unwrap();
        coordinator
            .save(&exchange("dos"), &mut identity)
            .await
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls[1], ("dos".to_string(), Some("c1".to_string())));
    }

    #[tokio::test]
    async fn missing_credential_fails_without_a_network_call() {
        let backend = RecordingBackend::returning(vec![Ok("c1".to_string())]);
        let coordinator = SaveCoordinator::new(
            backend.clone(),
            Arc::new(StaticCredentials { token: None }),
        );
        let mut identity = ConversationIdentity::new(MemoryStore::new());

        let err = coordinator
            .save(&exchange("hola"), &mut identity)
            .await
            .unwrap_err();

        assert!(matches!(err, BrakeError::AuthenticationMissing));
        assert!(backend.calls().is_empty());
        assert!(identity.is_new());
    }

    #[tokio::test]
    async fn failed_save_leaves_identity_untouched() {
        let backend =
            RecordingBackend::returning(vec![Err(BrakeError::persistence("boom"))]);
        let coordinator = SaveCoordinator::new(
            backend,
            Arc::new(StaticCredentials { token: Some("t") }),
        );
        let mut identity = ConversationIdentity::new(MemoryStore::new());

        let err = coordinator
            .save(&exchange("hola"), &mut identity)
            .await
            .unwrap_err();

        assert!(err.is_persistence_failure());
        assert!(identity.is_new());
        assert_eq!(identity.conversation_id(), None);
    }

    #[tokio::test]
    async fn queued_saves_run_one_at_a_time_in_queue_order() {
        let backend = RecordingBackend::returning(vec![
            Ok("c1".to_string()),
            Ok("c2".to_string()),
            Ok("c3".to_string()),
        ]);
        let coordinator = Arc::new(SaveCoordinator::new(
            backend.clone(),
            Arc::new(StaticCredentials { token: Some("t") }),
        ));

        // Three sessions writing through the same coordinator lock: the
        // backend asserts that no two calls overlap, and the FIFO waiter
        // queue preserves the order the saves were issued in.
        let store = MemoryStore::new();
        let mut identities: Vec<_> = (0..3)
            .map(|_| ConversationIdentity::new(store.clone()))
            .collect();
        let mut third = identities.pop().unwrap();
        let mut second = identities.pop().unwrap();
        let mut first = identities.pop().unwrap();

        let uno = exchange("uno");
        let dos = exchange("dos");
        let tres = exchange("tres");
        let (a, b, c) = tokio::join!(
            coordinator.save(&uno, &mut first),
            coordinator.save(&dos, &mut second),
            coordinator.save(&tres, &mut third),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let order: Vec<_> = backend.calls().into_iter().map(|(text, _)| text).collect();
        assert_eq!(order, vec!["uno", "dos", "tres"]);
    }
}

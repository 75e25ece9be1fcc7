//! Conversation session management.
//!
//! `ConversationManager` is the public façade over the message store, the
//! remote identity and the save coordinator. It is the only component other
//! layers call: screens send user text through [`send_exchange`] and read
//! the message list through [`snapshot`].
//!
//! [`send_exchange`]: ConversationManager::send_exchange
//! [`snapshot`]: ConversationManager::snapshot

use super::coordinator::SaveCoordinator;
use super::generation::ReplyGenerator;
use super::identity::ConversationIdentity;
use super::message::ChatMessage;
use super::model::{ConversationSummary, Exchange};
use super::repository::{ConversationBackend, ConversationHistory};
use super::store::MessageStore;
use crate::auth::CredentialProvider;
use crate::error::{BrakeError, Result};
use crate::storage::{KeyValueStore, keys};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Owns one active conversation: its message list and its remote identity.
///
/// A session is either *new* (no server id yet) or *continuing* (bound to a
/// server id). [`start`](Self::start) and [`resume`](Self::resume) replace
/// the active session; an exchange that was still in flight when that
/// happened has its results discarded (detected via a session epoch).
///
/// Exchanges for one session are serialized in invocation order: the
/// exchange lock is acquired before the first suspension point and its
/// waiter queue is FIFO, so batches reach the backend in the order
/// `send_exchange` was called even when calls overlap in wall-clock time.
pub struct ConversationManager {
    store: Mutex<MessageStore>,
    identity: Mutex<ConversationIdentity>,
    coordinator: SaveCoordinator,
    generator: Arc<dyn ReplyGenerator>,
    history: Arc<dyn ConversationHistory>,
    credentials: Arc<dyn CredentialProvider>,
    pointer: Arc<dyn KeyValueStore>,
    exchange_lock: Mutex<()>,
    epoch: AtomicU64,
}

impl ConversationManager {
    /// Creates a manager with a fresh, not-yet-persisted session.
    ///
    /// All collaborators are injected so tests can substitute in-memory
    /// fakes; nothing here reaches for ambient globals.
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        backend: Arc<dyn ConversationBackend>,
        history: Arc<dyn ConversationHistory>,
        credentials: Arc<dyn CredentialProvider>,
        pointer: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            store: Mutex::new(MessageStore::new()),
            identity: Mutex::new(ConversationIdentity::new(pointer.clone())),
            coordinator: SaveCoordinator::new(backend, credentials.clone()),
            generator,
            history,
            credentials,
            pointer,
            exchange_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Discards the current session and begins a fresh one.
    ///
    /// Clears the message list, the remote identity and the durable
    /// pointer. In-flight exchanges of the discarded session will observe
    /// the epoch change and drop their results.
    pub async fn start(&self) -> Result<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.lock().await.clear();

        let mut identity = self.identity.lock().await;
        *identity = ConversationIdentity::new(self.pointer.clone());
        identity.mark_new().await
    }

    /// Continues a previously persisted conversation.
    ///
    /// Loads the fetched messages verbatim, binds the known id and writes
    /// the durable pointer.
    pub async fn resume(&self, conversation: ConversationSummary) -> Result<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.lock().await.replace_all(conversation.messages);

        let mut identity = self.identity.lock().await;
        *identity = ConversationIdentity::new(self.pointer.clone());
        identity.bind(conversation.id).await
    }

    /// Restores the session persisted by a previous run.
    ///
    /// Reads the durable pointer; when it holds a conversation id the
    /// session continues under that identity, and the message list is
    /// loaded from the history service when a credential is available.
    /// Identity continuity does not depend on the history fetch: the next
    /// save carries the restored id either way.
    ///
    /// # Returns
    ///
    /// `true` if a previous conversation was restored, `false` if the
    /// session starts fresh.
    pub async fn restore(&self) -> Result<bool> {
        let restored = ConversationIdentity::restore(self.pointer.clone()).await?;
        let Some(id) = restored.conversation_id().map(str::to_string) else {
            return Ok(false);
        };

        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.identity.lock().await = restored;

        if let Some(credential) = self.credentials.credential().await {
            match self.history.fetch(&id, &credential).await {
                Ok(conversation) => {
                    self.store.lock().await.replace_all(conversation.messages);
                }
                Err(err) if err.is_not_found() => {
                    // The remote conversation is gone; continuing under its
                    // id would fork history, so fall back to a fresh one.
                    tracing::warn!(conversation_id = %id, "stored conversation no longer exists");
                    self.start().await?;
                    return Ok(false);
                }
                Err(err) => {
                    tracing::warn!(conversation_id = %id, error = %err, "could not load stored conversation");
                }
            }
        }

        Ok(true)
    }

    /// Sends one user message and appends the generated reply.
    ///
    /// The user message is appended optimistically, the reply generator is
    /// invoked, the reply is appended, and the pair is persisted through
    /// the save coordinator. Any failure rolls both messages back: after an
    /// error the message list is exactly what it was before the call.
    ///
    /// # Errors
    ///
    /// - [`BrakeError::Generation`]: the generator failed; the user message
    ///   was rolled back
    /// - [`BrakeError::Persistence`] / [`BrakeError::AuthenticationMissing`]:
    ///   the save failed; both messages were rolled back
    /// - [`BrakeError::Superseded`]: the session was replaced mid-exchange;
    ///   all results were discarded
    pub async fn send_exchange(&self, text: &str) -> Result<Exchange> {
        let _turn = self.exchange_lock.lock().await;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let user = ChatMessage::user(text);
        let mut staged = self.store.lock().await.stage(user.clone());

        let reply = match self.generator.generate(text).await {
            Ok(reply) => reply,
            Err(err) => {
                self.store.lock().await.revert(staged);
                return Err(self.superseded_or(epoch, err));
            }
        };

        if self.epoch.load(Ordering::SeqCst) != epoch {
            self.store.lock().await.revert(staged);
            return Err(BrakeError::Superseded);
        }

        let assistant = ChatMessage::assistant(reply.text, reply.emotion);
        self.store
            .lock()
            .await
            .stage_more(&mut staged, assistant.clone());

        let save_result = {
            let mut identity = self.identity.lock().await;
            if self.epoch.load(Ordering::SeqCst) != epoch {
                Err(BrakeError::Superseded)
            } else {
                self.coordinator
                    .save(&[user.clone(), assistant.clone()], &mut identity)
                    .await
            }
        };

        if let Err(err) = save_result {
            self.store.lock().await.revert(staged);
            return Err(self.superseded_or(epoch, err));
        }

        if self.epoch.load(Ordering::SeqCst) != epoch {
            // Saved remotely, but the session was replaced meanwhile; the
            // replacement session must not show this exchange.
            self.store.lock().await.revert(staged);
            return Err(BrakeError::Superseded);
        }

        self.store.lock().await.commit(staged);
        Ok(Exchange { user, assistant })
    }

    /// Lists the user's persisted conversations.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let credential = self
            .credentials
            .credential()
            .await
            .ok_or(BrakeError::AuthenticationMissing)?;
        self.history.list(&credential).await
    }

    /// Owned copy of the current message list.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.store.lock().await.snapshot()
    }

    /// The bound conversation id, if any.
    pub async fn conversation_id(&self) -> Option<String> {
        self.identity
            .lock()
            .await
            .conversation_id()
            .map(str::to_string)
    }

    /// True until the session's first save succeeds.
    pub async fn is_new(&self) -> bool {
        self.identity.lock().await.is_new()
    }

    /// Reads the durable pointer (test and diagnostics hook).
    pub async fn stored_pointer(&self) -> Result<Option<String>> {
        self.pointer.get(keys::ACTIVE_CONVERSATION).await
    }

    fn superseded_or(&self, epoch: u64, err: BrakeError) -> BrakeError {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            BrakeError::Superseded
        } else {
            err
        }
    }
}

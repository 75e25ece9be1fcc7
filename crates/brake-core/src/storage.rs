//! Durable key-value storage trait.
//!
//! The conversation core persists two small pieces of process-wide state:
//! the active conversation pointer and the bearer token. Both live in a
//! durable key-value slot so they survive app restarts.

use crate::error::Result;
use async_trait::async_trait;

/// Well-known storage keys.
pub mod keys {
    /// Server-assigned id of the conversation to continue after a restart.
    pub const ACTIVE_CONVERSATION: &str = "active_conversation";
    /// Bearer token obtained at login.
    pub const AUTH_TOKEN: &str = "token";
}

/// An abstract durable key-value store.
///
/// This trait decouples the conversation core from the concrete storage
/// mechanism (a JSON file, platform preferences, a database row). Values are
/// opaque strings; the store never interprets them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key` if present. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

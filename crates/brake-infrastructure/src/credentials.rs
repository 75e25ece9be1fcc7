//! Credential provider backed by the durable store.
//!
//! The bearer token obtained at login is kept in the durable key-value
//! store under the `token` slot; this provider reads it on demand.

use async_trait::async_trait;
use brake_core::auth::{Credential, CredentialProvider};
use brake_core::storage::{KeyValueStore, keys};
use std::sync::Arc;

/// Reads the bearer credential from the durable store.
pub struct StoredCredentialProvider {
    store: Arc<dyn KeyValueStore>,
}

impl StoredCredentialProvider {
    /// Creates a provider reading from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CredentialProvider for StoredCredentialProvider {
    async fn credential(&self) -> Option<Credential> {
        match self.store.get(keys::AUTH_TOKEN).await {
            Ok(token) => token.map(Credential::new),
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored credential");
                None
            }
        }
    }
}

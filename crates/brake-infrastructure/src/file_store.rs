//! File-backed durable key-value store.
//!
//! Backs the two durable slots the client needs (the active-conversation
//! pointer and the bearer token) with a single JSON document on disk. The
//! whole map is cached in memory and rewritten on every mutation; the
//! values involved are tiny.

use async_trait::async_trait;
use brake_core::error::{BrakeError, Result};
use brake_core::storage::KeyValueStore;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const STATE_FILE: &str = "state.json";

/// Durable key-value store persisted as `<base_dir>/state.json`.
pub struct FileKeyValueStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens (or creates) the store under `base_dir`.
    ///
    /// The directory is created if it doesn't exist; an existing state file
    /// is loaded into the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// state file cannot be read or parsed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;

        let path = base_dir.join(STATE_FILE);
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: Mutex::new(values),
        })
    }

    /// Opens the store at the default location (`~/.brake`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// store cannot be opened.
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| BrakeError::io("failed to get home directory"))?;
        Self::new(home_dir.join(".brake"))
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.cache.lock().await;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.cache.lock().await;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

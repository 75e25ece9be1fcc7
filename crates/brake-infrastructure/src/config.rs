//! Client configuration.
//!
//! Endpoint URLs and timeouts come from `config.toml` under the app
//! directory, with environment variable overrides for every endpoint.
//! Missing file or missing keys fall back to the defaults below.

use brake_core::error::{BrakeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";

fn default_generator_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_graphql_url() -> String {
    "http://localhost:3001/takeabrakemovil/graphql".to_string()
}

fn default_auth_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Endpoint and timeout configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the reply-generation service.
    #[serde(default = "default_generator_url")]
    pub generator_url: String,
    /// Full URL of the conversation GraphQL endpoint.
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    /// Base URL of the account REST API.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Request timeout applied to every outbound call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator_url: default_generator_url(),
            graphql_url: default_graphql_url(),
            auth_url: default_auth_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `<base_dir>/config.toml`, then applies
    /// environment overrides. A missing file yields the defaults.
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
        let path = base_dir.as_ref().join(CONFIG_FILE);
        let config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|err| BrakeError::Serialization {
                format: "TOML".to_string(),
                message: err.to_string(),
            })?
        } else {
            Self::default()
        };
        Ok(config.apply_env())
    }

    /// Applies `BRAKE_*` environment variable overrides.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("BRAKE_GENERATOR_URL") {
            self.generator_url = url;
        }
        if let Ok(url) = std::env::var("BRAKE_GRAPHQL_URL") {
            self.graphql_url = url;
        }
        if let Ok(url) = std::env::var("BRAKE_AUTH_URL") {
            self.auth_url = url;
        }
        if let Ok(secs) = std::env::var("BRAKE_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.request_timeout_secs = parsed;
            }
        }
        self
    }

    /// The configured request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

//! Error types for the Brake conversation client.

use thiserror::Error;

/// A shared error type for the conversation client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The two user-facing failure
/// classes are [`BrakeError::Generation`] ("could not get a reply") and
/// [`BrakeError::Persistence`] ("could not save the conversation"); both
/// leave the in-memory conversation exactly as it was before the exchange.
#[derive(Error, Debug, Clone)]
pub enum BrakeError {
    /// The reply-generation service failed (timeout, non-2xx, malformed body)
    #[error("Reply generation failed: {message}")]
    Generation { message: String },

    /// The conversation backend rejected or failed a save
    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    /// No credential is available; no network call was attempted
    #[error("Not authenticated")]
    AuthenticationMissing,

    /// The session was replaced (new/resumed conversation) while this
    /// exchange was in flight; its results were discarded
    #[error("Session was replaced while the exchange was in flight")]
    Superseded,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrakeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Generation error
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Check if this error means a save could not be completed.
    ///
    /// A missing credential is a persistence-class failure: the save is
    /// refused before any network call is attempted.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::AuthenticationMissing)
    }

    /// Check if this is a Superseded error
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for BrakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BrakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for BrakeError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, BrakeError>`.
pub type Result<T> = std::result::Result<T, BrakeError>;

//! Authentication collaborator contract.
//!
//! The conversation core never performs logins itself; it only asks an
//! injected provider for the current bearer credential right before a save.

use async_trait::async_trait;

/// An opaque bearer credential.
///
/// The token value is deliberately hidden from `Debug` output so it cannot
/// leak into logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Supplies the current bearer credential on demand.
///
/// `None` means the user is not logged in; the save coordinator treats that
/// as an unconditional failure and never attempts the network call.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the current credential, if any.
    async fn credential(&self) -> Option<Credential>;
}

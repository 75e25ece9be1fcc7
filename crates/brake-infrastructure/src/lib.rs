//! Infrastructure for the Take a Brake chat client.
//!
//! Concrete implementations of the contracts `brake-core` defines: the
//! reply-generation HTTP client, the GraphQL conversation backend, the
//! account REST client, the file-backed durable store, and the best-effort
//! track preview lookup.

pub mod auth_client;
pub mod config;
pub mod credentials;
pub mod file_store;
pub mod generation_client;
pub mod graphql_client;
pub mod track_preview;

pub use auth_client::{AuthClient, RegisterRequest};
pub use config::AppConfig;
pub use credentials::StoredCredentialProvider;
pub use file_store::FileKeyValueStore;
pub use generation_client::HttpReplyGenerator;
pub use graphql_client::GraphqlConversationClient;
pub use track_preview::{TrackPreviewClient, extract_track_links, strip_track_links};

//! Best-effort track preview metadata.
//!
//! Replies sometimes embed Spotify track links; the client shows them as
//! small preview cards. This is a pure side-lookup with no bearing on
//! conversation state: link extraction is local, the metadata fetch goes
//! through the public oEmbed endpoint, and any failure simply yields no
//! card.

use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

const OEMBED_URL: &str = "https://open.spotify.com/oembed";

fn track_url_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"https://open\.spotify\.com/track/[A-Za-z0-9]+")
            .expect("track url pattern is valid")
    })
}

/// Extracts track links from `text`, deduplicated, in order of first
/// appearance.
pub fn extract_track_links(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for found in track_url_pattern().find_iter(text) {
        let url = found.as_str().to_string();
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Removes track links from `text`, leaving the prose around them.
pub fn strip_track_links(text: &str) -> String {
    track_url_pattern().replace_all(text, "").trim().to_string()
}

/// Metadata shown on a track preview card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub thumbnail: String,
    pub provider: String,
}

#[derive(Deserialize)]
struct OembedResponse {
    title: String,
    thumbnail_url: String,
    provider_name: String,
}

/// Client for the track oEmbed endpoint.
#[derive(Clone)]
pub struct TrackPreviewClient {
    client: Client,
    oembed_url: String,
}

impl TrackPreviewClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> Option<Self> {
        let client = Client::builder().timeout(timeout).build().ok()?;
        Some(Self {
            client,
            oembed_url: OEMBED_URL.to_string(),
        })
    }

    /// Overrides the oEmbed endpoint (tests).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.oembed_url = url.into();
        self
    }

    /// Looks up preview metadata for `track_url`. Best-effort: any failure
    /// yields `None`.
    pub async fn lookup(&self, track_url: &str) -> Option<TrackMetadata> {
        let response = self
            .client
            .get(&self.oembed_url)
            .query(&[("url", track_url)])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let payload: OembedResponse = response.json().await.ok()?;
        Some(TrackMetadata {
            title: payload.title,
            thumbnail: payload.thumbnail_url,
            provider: payload.provider_name,
        })
    }
}

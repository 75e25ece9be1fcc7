//! HTTP client for the reply-generation service.
//!
//! The service is a small HTTP endpoint: `POST {base}/chat` with the user's
//! text, returning the generated reply and the emotion it detected in the
//! input. Every failure mode (timeout, non-2xx, malformed body) surfaces as
//! a generation error so the session manager can roll back the optimistic
//! user message.

use async_trait::async_trait;
use brake_core::conversation::{GeneratedReply, ReplyGenerator};
use brake_core::error::{BrakeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the reply-generation endpoint.
#[derive(Clone)]
pub struct HttpReplyGenerator {
    client: Client,
    base_url: String,
}

impl HttpReplyGenerator {
    /// Creates a client for the service at `base_url` with the given
    /// request timeout. A timeout is treated identically to a network
    /// failure.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BrakeError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    texto: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    respuesta_generada: String,
    #[serde(default)]
    emocion_detectada: Option<String>,
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate(&self, text: &str) -> Result<GeneratedReply> {
        let response = self
            .client
            .post(self.chat_url())
            .json(&GenerateRequest { texto: text })
            .send()
            .await
            .map_err(|err| BrakeError::generation(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(BrakeError::generation(format!(
                "status {status}: {body}"
            )));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| BrakeError::generation(format!("malformed response: {err}")))?;

        Ok(GeneratedReply {
            text: payload.respuesta_generada,
            emotion: payload.emocion_detectada,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing_keeps_the_detected_emotion() {
        let payload: GenerateResponse = serde_json::from_str(
            r#"{"respuesta_generada": "Respira hondo", "emocion_detectada": "ansiedad"}"#,
        )
        .unwrap();
        assert_eq!(payload.respuesta_generada, "Respira hondo");
        assert_eq!(payload.emocion_detectada.as_deref(), Some("ansiedad"));
    }

    #[test]
    fn response_parsing_tolerates_a_missing_emotion() {
        let payload: GenerateResponse =
            serde_json::from_str(r#"{"respuesta_generada": "Hola"}"#).unwrap();
        assert_eq!(payload.emocion_detectada, None);
    }

    #[test]
    fn chat_url_strips_trailing_slashes() {
        let client =
            HttpReplyGenerator::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.chat_url(), "http://localhost:5000/chat");
    }
}

//! GraphQL client for the conversation backend.
//!
//! Implements both the persistence and the history contracts against the
//! backend's GraphQL endpoint. Requests are plain JSON envelopes
//! (`{query, variables}`) with a bearer token; a GraphQL `errors` array or
//! a mutation payload without a conversation id counts as a failed save.

use async_trait::async_trait;
use brake_core::auth::Credential;
use brake_core::conversation::{
    ChatMessage, ConversationBackend, ConversationHistory, ConversationSummary, MessageRole,
    SaveReceipt,
};
use brake_core::error::{BrakeError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const SAVE_MESSAGES_MUTATION: &str = r#"
    mutation GuardarMensaje($input: ChatbotMovilInput!, $conversationId: ID) {
        guardarMensajesChat(input: $input, conversationId: $conversationId) {
            id
            mensaje { rol texto emotion }
        }
    }
"#;

const LIST_CONVERSATIONS_QUERY: &str = r#"
    query {
        obtenerChatPorUsuario {
            id
            mensaje { rol texto emotion fecha }
            fecha
        }
    }
"#;

/// Client for the conversation GraphQL endpoint.
#[derive(Clone)]
pub struct GraphqlConversationClient {
    client: Client,
    endpoint: String,
}

impl GraphqlConversationClient {
    /// Creates a client for the GraphQL endpoint at `endpoint` with the
    /// given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BrakeError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn execute<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: Value,
        credential: &Credential,
    ) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|err| BrakeError::persistence(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(BrakeError::persistence(format!("status {status}")));
        }

        let envelope: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|err| BrakeError::persistence(format!("malformed response: {err}")))?;

        if !envelope.errors.is_empty() {
            let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(BrakeError::persistence(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| BrakeError::persistence("response carried no data"))
    }
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct SaveData {
    #[serde(rename = "guardarMensajesChat")]
    saved: Option<SavedConversation>,
}

#[derive(Deserialize)]
struct SavedConversation {
    id: Option<String>,
}

#[derive(Deserialize)]
struct ListData {
    #[serde(rename = "obtenerChatPorUsuario")]
    conversations: Vec<WireConversation>,
}

#[derive(Deserialize)]
struct WireConversation {
    id: String,
    #[serde(default)]
    mensaje: Vec<WireMessage>,
    #[serde(default)]
    fecha: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    rol: String,
    texto: String,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    fecha: Option<String>,
}

fn save_variables(batch: &[ChatMessage], conversation_id: Option<&str>) -> Value {
    let mensajes: Vec<Value> = batch
        .iter()
        .map(|message| {
            json!({
                "rol": message.role.as_str(),
                "texto": message.text,
                "emotion": message.emotion,
            })
        })
        .collect();

    json!({
        "input": { "mensaje": mensajes },
        "conversationId": conversation_id,
    })
}

fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

impl WireConversation {
    fn into_summary(self) -> ConversationSummary {
        let created_at = parse_timestamp(self.fecha.as_deref());
        let messages = self
            .mensaje
            .into_iter()
            .map(|message| {
                let role = if message.rol == "user" {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                let timestamp = parse_timestamp(message.fecha.as_deref());
                ChatMessage::new(role, message.texto, message.emotion, timestamp)
            })
            .collect();
        ConversationSummary {
            id: self.id,
            messages,
            created_at,
        }
    }
}

#[async_trait]
impl ConversationBackend for GraphqlConversationClient {
    async fn save_messages(
        &self,
        batch: &[ChatMessage],
        conversation_id: Option<&str>,
        credential: &Credential,
    ) -> Result<SaveReceipt> {
        let variables = save_variables(batch, conversation_id);
        let data: SaveData = self
            .execute(SAVE_MESSAGES_MUTATION, variables, credential)
            .await?;

        let id = data
            .saved
            .and_then(|saved| saved.id)
            .ok_or_else(|| BrakeError::persistence("save returned no conversation id"))?;

        Ok(SaveReceipt {
            conversation_id: id,
        })
    }
}

#[async_trait]
impl ConversationHistory for GraphqlConversationClient {
    async fn list(&self, credential: &Credential) -> Result<Vec<ConversationSummary>> {
        let data: ListData = self
            .execute(LIST_CONVERSATIONS_QUERY, json!({}), credential)
            .await?;
        Ok(data
            .conversations
            .into_iter()
            .map(WireConversation::into_summary)
            .collect())
    }

    // The backend only exposes a list-per-user query, so fetching one
    // conversation filters the listing client-side.
    async fn fetch(
        &self,
        conversation_id: &str,
        credential: &Credential,
    ) -> Result<ConversationSummary> {
        self.list(credential)
            .await?
            .into_iter()
            .find(|conversation| conversation.id == conversation_id)
            .ok_or_else(|| BrakeError::not_found("conversation", conversation_id))
    }
}

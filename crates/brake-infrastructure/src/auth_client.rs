//! REST client for the account endpoints.
//!
//! Login and registration live on a separate REST API from the
//! conversation backend. A successful login yields the bearer token the
//! rest of the client presents to the GraphQL endpoint.

use brake_core::error::{BrakeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub nombre: String,
    pub apellido: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edad: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexo: Option<String>,
    pub email: String,
    pub password: String,
    /// Client platform tag the backend records with the account.
    pub plataforma: Vec<String>,
}

impl RegisterRequest {
    /// Builds a registration for this client, tagged with the `cli`
    /// platform.
    pub fn new(
        nombre: impl Into<String>,
        apellido: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            nombre: nombre.into(),
            apellido: apellido.into(),
            edad: None,
            sexo: None,
            email: email.into(),
            password: password.into(),
            plataforma: vec!["cli".to_string()],
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Client for the account REST endpoints.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Creates a client for the REST API at `base_url` with the given
    /// request timeout.
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

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Logs in and returns the bearer token.
    ///
    /// # Errors
    ///
    /// Returns a persistence-class error on bad credentials, network
    /// failure, or a response without a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|err| BrakeError::persistence(format!("login request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BrakeError::persistence(format!(
                "login rejected (status {status}): {body}"
            )));
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|err| BrakeError::persistence(format!("malformed login response: {err}")))?;
        Ok(payload.token)
    }

    /// Registers a new account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("register"))
            .json(request)
            .send()
            .await
            .map_err(|err| BrakeError::persistence(format!("register request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BrakeError::persistence(format!(
                "registration rejected (status {status}): {body}"
            )));
        }

        Ok(())
    }
}

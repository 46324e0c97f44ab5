//! Installation access token exchange.
//!
//! The signed App JWT is presented to
//! `POST {api_url}/app/installations/{id}/access_tokens`. GitHub answers
//! `201 Created` with the token; anything else is surfaced verbatim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::token_manager::SignedAssertion;
use crate::error::{Result, TokenError};

/// Fixed timeout for the exchange request
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT: &str = "application/vnd.github.v3+json";
const CONTENT_TYPE: &str = "application/json";

/// An outgoing POST request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

/// Status and raw body of a response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a request and returns the response. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// HTTPS transport backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .user_agent(concat!("ghtoken/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TokenError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.client.post(&request.url).body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TokenError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(TransportResponse { status, body })
    }
}

/// Response from GitHub's installation access token endpoint.
#[derive(Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub permissions: Option<serde_json::Value>,
    #[serde(default)]
    pub repository_selection: Option<String>,
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &format_args!("<{} bytes>", self.token.len()))
            .field("expires_at", &self.expires_at)
            .field("repository_selection", &self.repository_selection)
            .finish()
    }
}

/// Client for the App-authenticated token endpoint.
pub struct GitHubAppClient {
    api_url: String,
    transport: Arc<dyn Transport>,
}

impl GitHubAppClient {
    pub fn new(api_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_url: api_url.into(),
            transport,
        }
    }

    pub fn access_tokens_url(&self, installation_id: u64) -> String {
        format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, installation_id
        )
    }

    /// Exchange an App JWT for an installation access token.
    pub async fn exchange(
        &self,
        assertion: &SignedAssertion,
        installation_id: u64,
    ) -> Result<InstallationToken> {
        let url = self.access_tokens_url(installation_id);
        debug!(url = %url, "Requesting installation access token");

        let request = TransportRequest {
            url,
            headers: vec![
                ("Authorization", format!("Bearer {}", assertion.as_str())),
                ("Accept", ACCEPT.to_string()),
                ("Content-Type", CONTENT_TYPE.to_string()),
            ],
            body: b"{}".to_vec(),
        };

        let response = self.transport.post(request).await?;
        debug!(status = response.status, "GitHub API responded");

        if response.status != 201 {
            return Err(TokenError::Exchange {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(TokenError::ResponseParse)
    }
}

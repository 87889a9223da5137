//! Hosted Backend HTTP Client
//!
//! Thin wrapper over `reqwest` that knows how the hosted backend wants to
//! be called (the `apikey` header plus a bearer token) and how it reports
//! failures (a JSON body whose message field name varies by service).

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ProviderSettings;

/// Longest provider error body relayed verbatim.
const MAX_RELAYED_BODY: usize = 200;

/// Keys the provider uses for human-readable error text, most specific first.
const MESSAGE_KEYS: [&str; 4] = ["msg", "error_description", "message", "error"];

/// Failure talking to the hosted backend
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response (DNS, TLS, timeout)
    #[error("Provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The provider answered 2xx with a body we could not decode
    #[error("Unexpected provider response: {0}")]
    Decode(String),

    #[error("Invalid provider settings: {0}")]
    InvalidSettings(String),
}

impl ProviderError {
    /// Upstream HTTP status, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Client for the hosted backend's REST endpoints.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    base_url: Arc<str>,
    anon_key: Arc<str>,
}

impl ProviderClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        settings.validate()?;

        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ProviderError::InvalidSettings(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Arc::from(settings.url.trim_end_matches('/')),
            anon_key: Arc::from(settings.anon_key.as_str()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path below the project base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request carrying the `apikey` header.
    ///
    /// Authorized as the signed-in user when `access_token` is given,
    /// otherwise as the anonymous role.
    pub fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &*self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send and decode a JSON body.
    pub async fn send_json<T>(&self, request: RequestBuilder) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Send and discard the body.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), ProviderError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = status.as_u16(), %message, "Provider rejected request");

        Err(ProviderError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Extract the human-readable message from a provider error body.
///
/// Falls back to the raw body (truncated), then to the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            MESSAGE_KEYS
                .iter()
                .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        })
        .filter(|message| !message.trim().is_empty());

    if let Some(message) = from_json {
        return message;
    }

    let raw = body.trim();
    if raw.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    raw.chars().take(MAX_RELAYED_BODY).collect()
}

//! Transport for the liveness call.
//!
//! The life cycle only sees the [`LivenessTransport`] trait. [`HttpTransport`]
//! talks to the real API; [`MockTransport`] replays a canned reply and
//! records what it was sent.

use super::LivenessRequest;
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use thiserror::Error;

/// Message stored in the life cycle when the call fails.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error occurred during the API request.";

const APP_ID_HEADER: &str = "App-ID";
const API_KEY_HEADER: &str = "API-Key";
const JSON: &str = "application/json";

/// Errors that can occur while performing the call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint or headers could not be set up.
    #[error("invalid API configuration: {0}")]
    Config(String),
    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Network(String),
    /// The response body is not JSON.
    #[error("response body is not JSON: {0}")]
    InvalidBody(String),
}

/// Raw reply: status plus parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}

impl TransportResponse {
    /// A 200 response with `body`.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// True for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs exactly one liveness call per invocation.
#[async_trait]
pub trait LivenessTransport: Send + Sync {
    /// Posts one request and returns the parsed response.
    async fn send(&self, request: &LivenessRequest<'_>)
        -> Result<TransportResponse, TransportError>;
}

/// HTTP transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    app_id: HeaderValue,
    api_key: HeaderValue,
}

impl HttpTransport {
    /// Builds a transport from validated API settings.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let endpoint = reqwest::Url::parse(&config.url)
            .map_err(|e| TransportError::Config(format!("url `{}`: {e}", config.url)))?;
        let app_id = HeaderValue::from_str(&config.app_id)
            .map_err(|_| TransportError::Config("app id is not a valid header value".into()))?;
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| TransportError::Config("api key is not a valid header value".into()))?;
        api_key.set_sensitive(true);

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            app_id,
            api_key,
        })
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl LivenessTransport for HttpTransport {
    async fn send(
        &self,
        request: &LivenessRequest<'_>,
    ) -> Result<TransportResponse, TransportError> {
        let body = request
            .to_json()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        tracing::debug!(
            endpoint = %self.endpoint,
            body_bytes = body.len(),
            "Sending liveness request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header(APP_ID_HEADER, self.app_id.clone())
            .header(API_KEY_HEADER, self.api_key.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Liveness API returned an error status");
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Canned reply for [`MockTransport`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with this status and body.
    Respond(TransportResponse),
    /// Fail as if the network were down.
    NetworkFailure(String),
    /// Respond with a body that is not JSON.
    Garbage,
}

/// In-memory transport for tests and dry runs.
///
/// Clones share the call counter and the record of the last body sent.
#[derive(Debug, Clone)]
pub struct MockTransport {
    reply: MockReply,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
}

impl MockTransport {
    /// A mock that answers every call with `reply`.
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
        }
    }

    /// Replies 200 with the given JSON body.
    pub fn responding(body: Value) -> Self {
        Self::new(MockReply::Respond(TransportResponse::ok(body)))
    }

    /// Fails every call with a network error.
    pub fn failing() -> Self {
        Self::new(MockReply::NetworkFailure("connection refused".into()))
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Body of the most recent call.
    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().ok().and_then(|body| body.clone())
    }
}

#[async_trait]
impl LivenessTransport for MockTransport {
    async fn send(
        &self,
        request: &LivenessRequest<'_>,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sent = serde_json::to_value(request).map_err(|e| TransportError::Config(e.to_string()))?;
        if let Ok(mut last) = self.last_body.lock() {
            *last = Some(sent);
        }

        match &self.reply {
            MockReply::Respond(response) => Ok(response.clone()),
            MockReply::NetworkFailure(reason) => Err(TransportError::Network(reason.clone())),
            MockReply::Garbage => Err(TransportError::InvalidBody("expected value at line 1 column 1".into())),
        }
    }
}

//! HTTP client abstraction for the upstream model API.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request execution,
//! enabling testability with mock implementations.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Chat-completions path on OpenAI-compatible endpoints.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Response from an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

/// Trait for executing chat-completions requests.
///
/// This abstraction allows for different implementations (production vs. testing)
/// and makes the assessment pipeline testable without making real HTTP calls.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body to `{endpoint}/v1/chat/completions`.
    ///
    /// # Errors
    /// Returns an error only for transport-level failures (network, timeout,
    /// invalid URL). Non-2xx responses are returned as `HttpResponse` values so
    /// the caller can classify them.
    async fn execute(
        &self,
        endpoint: &str,
        api_key: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new reqwest-based HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, api_key, body), fields(endpoint = %endpoint))]
    async fn execute(
        &self,
        endpoint: &str,
        api_key: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let url = format!("{}{}", endpoint, CHAT_COMPLETIONS_PATH);

        tracing::debug!(url = %url, body_len = body.len(), "Executing HTTP request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "HTTP request failed");
                e
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status = status, response_len = body.len(), "HTTP request completed");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use parking_lot::Mutex;
use std::sync::Arc;

/// Mock HTTP client for testing.
///
/// Returns canned responses in FIFO order and records every call, so tests can
/// drive the retry policy and pipeline without real HTTP traffic.
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<Vec<Result<HttpResponse>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a call made to the mock HTTP client.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub endpoint: String,
    pub api_key: String,
    pub body: String,
    pub timeout: Duration,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response. Responses are consumed in FIFO order.
    pub fn push_response(&self, response: Result<HttpResponse>) {
        self.responses.lock().push(response);
    }

    /// Queue a response with the given status and body.
    pub fn push_status(&self, status: u16, body: &str) {
        self.push_response(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Get all calls that have been made to this mock client.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(
        &self,
        endpoint: &str,
        api_key: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        self.calls.lock().push(MockCall {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            body,
            timeout,
        });

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err(crate::error::ReportError::Api(
                "no mock response configured".to_string(),
            ));
        }
        responses.remove(0)
    }
}

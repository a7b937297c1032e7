//! HTTP transport port - abstraction over the REST backend.

use async_trait::async_trait;

use crate::domain::HttpRequest;

/// Raw response as received from the backend, before normalization.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait - abstraction over HTTP clients (reqwest, test fakes).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request, attaching `Authorization: Bearer <token>` when a token is given.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failures
    /// to complete the exchange are errors.
    async fn send(
        &self,
        request: &HttpRequest,
        bearer: Option<&str>,
    ) -> Result<TransportResponse, TransportError>;
}

/// Transport failures - the request could not complete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

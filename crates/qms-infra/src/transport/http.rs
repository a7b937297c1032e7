//! reqwest-based transport for the QuickMySlot REST backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Instrument;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use uuid::Uuid;

use qms_core::domain::{FormData, FormValue, HttpMethod, HttpRequest, RequestBody};
use qms_core::ports::{Transport, TransportError, TransportResponse};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("qms-admin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("QMS_BASE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("QMS_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: std::env::var("QMS_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// Transport over a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        // Without a trailing slash `Url::join` would replace the last segment
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| TransportError::InvalidRequest(format!("base url {base}: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        tracing::info!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self { client, base_url })
    }

    /// Create from environment configuration.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::new(HttpConfig::from_env())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidRequest(format!("path {path}: {e}")))
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn multipart(form: &FormData) -> Result<Form, TransportError> {
        let mut multipart = Form::new();
        for part in form.parts() {
            multipart = match &part.value {
                FormValue::Text(text) => multipart.text(part.name.clone(), text.clone()),
                FormValue::File(file) => {
                    let mut body = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                    if let Some(content_type) = &file.content_type {
                        body = body
                            .mime_str(content_type)
                            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                    }
                    multipart.part(part.name.clone(), body)
                }
            };
        }
        Ok(multipart)
    }

    fn map_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        bearer: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
        );
        self.dispatch(request, bearer, request_id)
            .instrument(span)
            .await
    }
}

impl ReqwestTransport {
    async fn dispatch(
        &self,
        request: &HttpRequest,
        bearer: Option<&str>,
        request_id: Uuid,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(&request.path)?;

        let mut builder = self
            .client
            .request(Self::method(request.method), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(form) => builder.multipart(Self::multipart(form)?),
        };

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = Self::map_error(e);
            tracing::error!(error = %err, "Request failed");
            err
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::debug!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

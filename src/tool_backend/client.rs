//! HTTP client for the function backend.
//!
//! The [`ToolBackend`] trait is the port the catalog and invoker depend on;
//! [`HttpToolBackend`] is the reqwest adapter for the real service. Deadlines
//! are applied by the callers, so the adapter itself only bounds the connect
//! phase.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::errors::ToolBackendError;
use super::types::{Availability, BackendResponse, FunctionsResponse, ToolCallRequest, ToolDeclaration};
use crate::status::status_name;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const FUNCTIONS_PATH: &str = "mcp/functions";
const EXECUTE_PATH: &str = "mcp/execute";
const STATUS_PATH: &str = "mcp/status";

// ─── Port ────────────────────────────────────────────────────────────────────

/// Abstract function backend.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the tool declarations. Non-2xx statuses and bodies without a
    /// `functions` array are errors.
    async fn list_tools(&self) -> Result<Vec<ToolDeclaration>, ToolBackendError>;

    /// Execute one tool call. Any HTTP status is returned as a response;
    /// only transport failures are errors.
    async fn execute(&self, request: &ToolCallRequest) -> Result<BackendResponse, ToolBackendError>;

    /// Probe the backend's status endpoint.
    async fn status(&self) -> Result<BackendResponse, ToolBackendError>;
}

// ─── HttpToolBackend ─────────────────────────────────────────────────────────

/// reqwest-backed [`ToolBackend`].
pub struct HttpToolBackend {
    http: HttpClient,
    base_url: String,
}

impl HttpToolBackend {
    /// Create a client for the backend rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ToolBackendError> {
        if base_url.trim().is_empty() {
            return Err(ToolBackendError::ConfigError {
                reason: "tool backend base_url is empty".into(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ToolBackendError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_response(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<BackendResponse, ToolBackendError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(endpoint, e))?;
        Ok(BackendResponse { status, body })
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn list_tools(&self) -> Result<Vec<ToolDeclaration>, ToolBackendError> {
        let endpoint = self.url(FUNCTIONS_PATH);
        tracing::debug!(endpoint = %endpoint, "fetching tool declarations");

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| map_transport_error(&endpoint, e))?;
        let response = self.read_response(&endpoint, response).await?;

        if !response.is_success() {
            return Err(ToolBackendError::HttpError {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: FunctionsResponse =
            serde_json::from_str(&response.body).map_err(|e| ToolBackendError::InvalidResponse {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        Ok(parsed.functions)
    }

    async fn execute(&self, request: &ToolCallRequest) -> Result<BackendResponse, ToolBackendError> {
        let endpoint = self.url(EXECUTE_PATH);
        tracing::debug!(endpoint = %endpoint, tool = %request.name, "executing tool");

        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| map_transport_error(&endpoint, e))?;
        self.read_response(&endpoint, response).await
    }

    async fn status(&self) -> Result<BackendResponse, ToolBackendError> {
        let endpoint = self.url(STATUS_PATH);
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| map_transport_error(&endpoint, e))?;
        self.read_response(&endpoint, response).await
    }
}

// ─── Status Probe ────────────────────────────────────────────────────────────

/// Probe backend availability within `timeout`. Never fails.
pub async fn check_availability(backend: &dyn ToolBackend, timeout: Duration) -> Availability {
    let result = match tokio::time::timeout(timeout, backend.status()).await {
        Ok(result) => result,
        Err(_) => Err(ToolBackendError::Timeout {
            endpoint: STATUS_PATH.into(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    match result {
        Ok(response) if response.is_success() => Availability {
            available: true,
            message: "Service is available".into(),
        },
        Ok(response) => {
            tracing::warn!(status = response.status, "tool backend status check returned error");
            Availability {
                available: false,
                message: format!(
                    "Service returned error: {}, {}",
                    status_name(response.status),
                    response.body
                ),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "tool backend unavailable");
            Availability {
                available: false,
                message: format!("Service is unavailable: {e}"),
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Ensure exactly one trailing slash so relative paths join cleanly.
fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}

fn map_transport_error(endpoint: &str, e: reqwest::Error) -> ToolBackendError {
    if e.is_timeout() {
        ToolBackendError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
        }
    } else {
        ToolBackendError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}

//! Tool execution with a bounded deadline.
//!
//! Every outcome, including transport failures, comes back as a
//! [`ToolCallResult`] whose raw text is fed to the model as-is.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::client::ToolBackend;
use super::errors::ToolBackendError;
use super::types::{BackendResponse, ToolCallRequest, ToolCallResult};
use crate::status::status_name;

/// Default bound on one tool execution.
pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes named tool calls against the backend.
#[derive(Clone)]
pub struct ToolInvoker {
    backend: Arc<dyn ToolBackend>,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(backend: Arc<dyn ToolBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Execute one call. Never fails.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolCallResult {
        let start = Instant::now();
        let result = match self.call(request).await {
            Ok(response) if response.is_success() => ToolCallResult::from_raw(response.body),
            Ok(response) => ToolCallResult::error(&format!(
                "Error executing function: {}, {}",
                status_name(response.status),
                response.body
            )),
            Err(e) => ToolCallResult::error(&format!("Exception executing function: {e}")),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if result.success {
            tracing::info!(tool = %request.name, elapsed_ms, "tool call succeeded");
        } else {
            tracing::warn!(tool = %request.name, elapsed_ms, result = %result.raw, "tool call failed");
        }
        result
    }

    async fn call(&self, request: &ToolCallRequest) -> Result<BackendResponse, ToolBackendError> {
        match tokio::time::timeout(self.timeout, self.backend.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(ToolBackendError::Timeout {
                endpoint: "mcp/execute".into(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

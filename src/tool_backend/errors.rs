//! Tool backend error types.

use thiserror::Error;

/// Errors that can occur while talking to the function backend.
///
/// None of these escape the catalog or the invoker: the catalog degrades to
/// an empty tool list and the invoker folds them into a JSON error envelope.
#[derive(Debug, Error)]
pub enum ToolBackendError {
    /// TCP/HTTP connection to the backend failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The backend did not answer within the caller's deadline.
    #[error("request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// Client construction or base URL problem.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

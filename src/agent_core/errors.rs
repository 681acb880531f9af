//! Agent Core error types.

use thiserror::Error;

use crate::inference::InferenceError;

use super::types::LoopState;

/// Errors that can end an orchestration run.
///
/// These never leave [`OrchestrationLoop::run`](super::orchestrator::OrchestrationLoop::run);
/// each one is turned into a single assistant message by [`user_message`](Self::user_message).
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model endpoint answered with a non-2xx status.
    #[error("model call failed: HTTP {status}: {body}")]
    ModelCallFailed {
        status: u16,
        status_name: String,
        body: String,
    },

    /// The model answered 2xx but the body was not a usable completion.
    #[error("invalid model response: {reason}")]
    InvalidModelResponse { reason: String },

    /// The session deadline elapsed.
    #[error("session timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Transport-level failure (connect, per-request timeout, config).
    #[error("{reason}")]
    Transport { reason: String },

    /// A state transition that the loop's state machine forbids.
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: LoopState, to: LoopState },
}

impl AgentError {
    /// Text appended to the conversation when this error ends a run.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::ModelCallFailed {
                status_name, body, ..
            } => format!("Error communicating with the language model: {status_name}, {body}"),
            AgentError::InvalidModelResponse { .. } => "Invalid response from language model".to_string(),
            AgentError::Timeout { .. } => {
                "The request timed out. The server took too long to respond.".to_string()
            }
            AgentError::Transport { reason } => format!("An error occurred: {reason}"),
            AgentError::InvalidTransition { .. } => format!("An error occurred: {self}"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AgentError::Timeout { .. })
    }
}

impl From<InferenceError> for AgentError {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::HttpError {
                status,
                status_name,
                body,
            } => AgentError::ModelCallFailed {
                status,
                status_name,
                body,
            },
            InferenceError::InvalidResponse { reason } => AgentError::InvalidModelResponse { reason },
            other => AgentError::Transport {
                reason: other.to_string(),
            },
        }
    }
}

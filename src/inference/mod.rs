//! Inference Client — OpenAI-compatible chat completions.
//!
//! This module handles all communication with the language model:
//! - Request building for OpenAI and Azure OpenAI endpoints
//! - One-shot parsing of completions into `ModelReply`
//! - The `ChatModel` trait the orchestration loop is written against

pub mod client;
pub mod errors;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use client::{ChatModel, InferenceClient};
pub use errors::InferenceError;
pub use types::{ChatMessage, ModelReply, RawToolCall, Role, ToolDefinition};

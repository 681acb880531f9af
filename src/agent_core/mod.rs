//! Agent Core — conversation state and the orchestration loop.
//!
//! Submodules:
//! - `conversation`: Versioned message history with change notification
//! - `orchestrator`: The model ↔ tool loop for one user turn
//! - `types`: Messages, events, loop states and run outcomes
//! - `errors`: Agent-level error types

pub mod conversation;
pub mod errors;
pub mod orchestrator;
pub mod types;

// Re-exports for convenience
pub use conversation::ConversationStore;
pub use errors::AgentError;
pub use orchestrator::OrchestrationLoop;
pub use types::{ConversationEvent, LoopState, Message, RunOutcome, RunStatus};

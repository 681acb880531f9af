//! Shared types for the agent core.
//!
//! Conversation messages, change notifications, loop states and run
//! outcomes used across the ConversationStore and OrchestrationLoop.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::inference::types::{ChatMessage, Role};

// ─── Conversation Messages ──────────────────────────────────────────────────

/// A single message stored in conversation history.
///
/// Fields are private so that `name` can only be set on function-role
/// messages, which carry the name of the tool that produced them. Messages
/// are built through the constructors only, never deserialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: Uuid,
    created_at: DateTime<Utc>,
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Message {
    fn new(role: Role, content: String, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            role,
            content,
            name,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), None)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into(), None)
    }

    /// Result of the tool `name`.
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Function, content.into(), Some(name.into()))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Tool name; `Some` only for function-role messages.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.role == Role::Function && self.name.as_deref() == Some(name)
    }

    /// Wire form for the model. `name` is dropped when `include_name` is off.
    pub fn to_chat_message(&self, include_name: bool) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: Some(self.content.clone()),
            name: if include_name { self.name.clone() } else { None },
        }
    }
}

// ─── Notifications ──────────────────────────────────────────────────────────

/// Change published by the ConversationStore after each mutation.
///
/// `version` is the store's version after the change was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    Appended {
        version: u64,
        index: usize,
        message: Message,
    },
    Removed {
        version: u64,
        name: String,
        count: usize,
    },
    Inserted {
        version: u64,
        index: usize,
        message: Message,
    },
    Cleared {
        version: u64,
    },
}

impl ConversationEvent {
    pub fn version(&self) -> u64 {
        match self {
            ConversationEvent::Appended { version, .. }
            | ConversationEvent::Removed { version, .. }
            | ConversationEvent::Inserted { version, .. }
            | ConversationEvent::Cleared { version } => *version,
        }
    }
}

// ─── Loop State ─────────────────────────────────────────────────────────────

/// Where the orchestration loop is within one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    AwaitingUserInput,
    ModelCallPending,
    ToolCallPending,
    ResponseReady,
    Failed,
}

impl LoopState {
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use LoopState::*;
        matches!(
            (self, target),
            (AwaitingUserInput, ModelCallPending)
                | (ModelCallPending, ToolCallPending)
                | (ModelCallPending, ResponseReady)
                | (ToolCallPending, ModelCallPending)
                | (ResponseReady, AwaitingUserInput)
                | (Failed, ModelCallPending)
                | (Failed, AwaitingUserInput)
                | (AwaitingUserInput, Failed)
                | (ModelCallPending, Failed)
                | (ToolCallPending, Failed)
        )
    }

    pub fn valid_transitions(&self) -> Vec<Self> {
        use LoopState::*;
        [
            AwaitingUserInput,
            ModelCallPending,
            ToolCallPending,
            ResponseReady,
            Failed,
        ]
        .into_iter()
        .filter(|target| self.can_transition_to(target))
        .collect()
    }
}

// ─── Run Outcome ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    TimedOut,
    Failed,
}

/// Summary of one `run()`; the conversation itself holds the visible result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Tool rounds executed.
    pub rounds: u32,
    /// Tool calls actually sent to the backend.
    pub tool_calls: usize,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// HTTP status a wrapping service should answer with.
    pub fn status_code(&self) -> u16 {
        match self.status {
            RunStatus::Completed => 200,
            RunStatus::TimedOut => 504,
            RunStatus::Failed => 500,
        }
    }
}

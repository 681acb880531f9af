//! ChatSession — the UI-facing handle for one conversation.
//!
//! Bundles a [`ConversationStore`] with the [`OrchestrationLoop`] that drives
//! it and the tool backend used for availability checks.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::agent_core::{ConversationEvent, ConversationStore, Message, OrchestrationLoop, RunOutcome};
use crate::config::AppConfig;
use crate::inference::{InferenceClient, InferenceError};
use crate::tool_backend::{
    check_availability, Availability, HttpToolBackend, ToolBackend, ToolBackendError, ToolCatalog,
    ToolDeclaration, ToolInvoker,
};

/// Failure to assemble a session from configuration.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("model client: {0}")]
    Inference(#[from] InferenceError),

    #[error("tool backend: {0}")]
    ToolBackend(#[from] ToolBackendError),
}

pub struct ChatSession {
    store: ConversationStore,
    agent: OrchestrationLoop,
    backend: Arc<dyn ToolBackend>,
    status_timeout: Duration,
}

impl ChatSession {
    pub fn new(agent: OrchestrationLoop, backend: Arc<dyn ToolBackend>, status_timeout: Duration) -> Self {
        Self {
            store: ConversationStore::new(),
            agent,
            backend,
            status_timeout,
        }
    }

    /// Wire up the HTTP adapters described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        let backend: Arc<dyn ToolBackend> = Arc::new(HttpToolBackend::new(&config.tool_backend.base_url)?);
        let model = Arc::new(InferenceClient::from_config(&config.model)?);

        let catalog = Arc::new(ToolCatalog::new(
            backend.clone(),
            config.tool_backend.catalog_timeout(),
        ));
        let invoker = ToolInvoker::new(backend.clone(), config.tool_backend.execute_timeout());
        let agent = OrchestrationLoop::new(model, catalog, invoker, config.orchestrator.clone());

        tracing::info!(
            tool_backend = %config.tool_backend.base_url,
            model_endpoint = %config.model.base_url,
            "chat session created"
        );
        Ok(Self::new(agent, backend, config.tool_backend.status_timeout()))
    }

    /// Run one user turn. The outcome is also visible in [`messages`](Self::messages).
    pub async fn send_message(&mut self, text: &str) -> RunOutcome {
        self.agent.run(&mut self.store, text).await
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.store.subscribe()
    }

    /// Append a message without running the loop.
    pub fn add_message(&mut self, message: Message) {
        self.store.append(message);
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub async fn check_availability(&self) -> Availability {
        check_availability(self.backend.as_ref(), self.status_timeout).await
    }

    /// Forget the cached catalog and fetch it again.
    pub async fn refresh_tools(&self) -> Vec<ToolDeclaration> {
        let catalog = self.agent.catalog();
        catalog.invalidate().await;
        catalog.fetch().await
    }

    /// Tools currently known to the session (fetched on first use).
    pub async fn tools(&self) -> Vec<ToolDeclaration> {
        self.agent.catalog().fetch().await
    }
}

//! Session-scoped tool catalog.
//!
//! Fetches the backend's tool declarations once and memoizes them. A failed
//! fetch degrades to an empty list and leaves the cache empty so the next
//! call retries.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::client::ToolBackend;
use super::errors::ToolBackendError;
use super::types::ToolDeclaration;

/// Default bound on a catalog fetch.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Memoized list of callable tools.
pub struct ToolCatalog {
    backend: Arc<dyn ToolBackend>,
    timeout: Duration,
    /// Held across the network call: concurrent fetches wait, then read the cache.
    cached: Mutex<Option<Vec<ToolDeclaration>>>,
}

impl ToolCatalog {
    pub fn new(backend: Arc<dyn ToolBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached declarations, fetching them on first use.
    ///
    /// Never fails: any backend problem yields an empty list.
    pub async fn fetch(&self) -> Vec<ToolDeclaration> {
        let mut cached = self.cached.lock().await;
        if let Some(tools) = cached.as_ref() {
            return tools.clone();
        }

        match self.fetch_from_backend().await {
            Ok(tools) => {
                let tools = dedupe_by_name(tools);
                tracing::info!(count = tools.len(), "tool catalog loaded");
                *cached = Some(tools.clone());
                tools
            }
            Err(e) => {
                tracing::warn!(error = %e, "tool catalog unavailable, continuing without tools");
                Vec::new()
            }
        }
    }

    /// Drop the cached declarations so the next [`fetch`](Self::fetch) hits the backend.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Number of cached tools, `None` when nothing is cached.
    pub async fn cached_len(&self) -> Option<usize> {
        self.cached.lock().await.as_ref().map(Vec::len)
    }

    async fn fetch_from_backend(&self) -> Result<Vec<ToolDeclaration>, ToolBackendError> {
        match tokio::time::timeout(self.timeout, self.backend.list_tools()).await {
            Ok(result) => result,
            Err(_) => Err(ToolBackendError::Timeout {
                endpoint: "mcp/functions".into(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// First occurrence of each name wins.
fn dedupe_by_name(tools: Vec<ToolDeclaration>) -> Vec<ToolDeclaration> {
    let mut seen = HashSet::new();
    tools
        .into_iter()
        .filter(|tool| {
            let fresh = seen.insert(tool.name.clone());
            if !fresh {
                tracing::warn!(tool = %tool.name, "duplicate tool declaration dropped");
            }
            fresh
        })
        .collect()
}

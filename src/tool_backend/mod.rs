//! Function backend integration.
//!
//! Talks to the remote service that exposes callable tools over HTTP
//! (`mcp/functions`, `mcp/execute`, `mcp/status`).
//!
//! Modules:
//! - `types` — declarations, call requests, normalized results
//! - `errors` — backend error taxonomy
//! - `client` — `ToolBackend` port and its reqwest adapter
//! - `catalog` — memoized tool list
//! - `invoker` — bounded tool execution with JSON error envelopes

pub mod catalog;
pub mod client;
pub mod errors;
pub mod invoker;
pub mod types;

pub use catalog::ToolCatalog;
pub use client::{check_availability, HttpToolBackend, ToolBackend};
pub use errors::ToolBackendError;
pub use invoker::ToolInvoker;
pub use types::{
    Availability, BackendResponse, ParameterProperty, ParameterSchema, ToolCallRequest,
    ToolCallResult, ToolDeclaration,
};

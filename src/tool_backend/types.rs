//! Shared types for the tool backend.
//!
//! Wire shapes of the function backend (`mcp/functions`, `mcp/execute`) and
//! the normalized result handed to the orchestration loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Declarations ────────────────────────────────────────────────────────────

/// A callable tool as advertised by `GET mcp/functions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: ParameterSchema,
}

/// JSON-schema-like description of a tool's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterProperty>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: Vec<String>,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterProperty {
    #[serde(rename = "type", default = "default_property_type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_schema_type() -> String {
    "object".to_string()
}

fn default_property_type() -> String {
    "string".to_string()
}

/// The backend serializes unset optional fields as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope returned by `GET mcp/functions`.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsResponse {
    pub functions: Vec<ToolDeclaration>,
}

// ─── Calls ───────────────────────────────────────────────────────────────────

/// A parsed tool call, ready for `POST mcp/execute`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Raw HTTP outcome from the backend: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of one tool execution as seen by the conversation.
///
/// `raw` becomes the content of a function-role message verbatim. `success`
/// is derived, never reported by the backend: a JSON object carrying an
/// `"error"` key is a failure, anything else is a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    pub raw: String,
    pub success: bool,
}

impl ToolCallResult {
    pub fn from_raw(raw: String) -> Self {
        let success = !has_error_key(&raw);
        Self { raw, success }
    }

    /// Build the `{"error": "..."}` envelope.
    ///
    /// Formatted with a space after the colon to match the backend's own
    /// error bodies; the message itself is JSON-escaped.
    pub fn error(message: &str) -> Self {
        let escaped = serde_json::Value::String(message.to_string()).to_string();
        Self {
            raw: format!("{{\"error\": {escaped}}}"),
            success: false,
        }
    }
}

fn has_error_key(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.contains_key("error")))
        .unwrap_or(false)
}

/// Outcome of the backend status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    pub message: String,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

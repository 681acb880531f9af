//! Shared types for the inference client.
//!
//! These mirror the OpenAI Chat Completions API types used for request
//! building, plus the parsed [`ModelReply`] handed to the orchestration loop.

use serde::{Deserialize, Serialize};

use crate::tool_backend::ToolDeclaration;

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message as sent to the model.
///
/// `content` is serialized as `""` rather than `null`; `name` is only present
/// for function-role messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(serialize_with = "serialize_content")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn serialize_content<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(s) => serializer.serialize_str(s),
        None => serializer.serialize_str(""),
    }
}

/// Message role. `Function` is the legacy role for tool results, which the
/// model correlates with its directive by `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool definition sent in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

/// Function definition within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDeclaration> for ToolDefinition {
    fn from(decl: &ToolDeclaration) -> Self {
        let properties: serde_json::Map<String, serde_json::Value> = decl
            .parameters
            .properties
            .iter()
            .map(|(name, prop)| {
                let mut schema = serde_json::Map::new();
                schema.insert("type".into(), serde_json::Value::String(prop.property_type.clone()));
                schema.insert(
                    "description".into(),
                    serde_json::Value::String(prop.description.clone().unwrap_or_default()),
                );
                (name.clone(), serde_json::Value::Object(schema))
            })
            .collect();

        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: decl.name.clone(),
                description: decl.description.clone(),
                parameters: serde_json::json!({
                    "type": decl.parameters.schema_type,
                    "properties": properties,
                    "required": decl.parameters.required,
                }),
            },
        }
    }
}

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// A tool call exactly as the model emitted it. `arguments` is still the
/// JSON-encoded string; validation happens in the orchestration loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToolCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// The model's reply, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// Plain answer, possibly with no content at all.
    DirectResponse { text: Option<String> },
    /// The model wants one or more tools run before it answers.
    ToolDirective {
        interim_text: Option<String>,
        calls: Vec<RawToolCall>,
    },
}

impl ModelReply {
    /// Visible text of the reply, whichever variant it is.
    pub fn text(&self) -> Option<&str> {
        match self {
            ModelReply::DirectResponse { text } => text.as_deref(),
            ModelReply::ToolDirective { interim_text, .. } => interim_text.as_deref(),
        }
    }

    pub fn is_tool_directive(&self) -> bool {
        matches!(self, ModelReply::ToolDirective { .. })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

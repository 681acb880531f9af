//! Chat completion response parsing.
//!
//! Turns a non-streaming chat completions body into a [`ModelReply`]. Tool
//! call arguments are left as the raw JSON strings the model produced.

use serde::Deserialize;

use super::errors::InferenceError;
use super::types::{ModelReply, RawToolCall};

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Deserialize)]
struct CompletionToolCall {
    #[serde(default)]
    function: Option<CompletionFunction>,
}

#[derive(Deserialize)]
struct CompletionFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Parse a chat completions body.
///
/// Only a `null` body or one that is not JSON is an
/// [`InferenceError::InvalidResponse`]. A missing `choices[0].message` is a
/// direct response without text, as is an empty `tool_calls` array. Blank
/// content is treated as absent.
pub fn parse_completion(body: &str) -> Result<ModelReply, InferenceError> {
    let resp: Option<CompletionResponse> = serde_json::from_str(body)?;

    let resp = resp.ok_or_else(|| InferenceError::InvalidResponse {
        reason: "null completion body".into(),
    })?;

    let Some(message) = resp.choices.into_iter().next().and_then(|choice| choice.message) else {
        tracing::warn!("completion has no choices[0].message");
        return Ok(ModelReply::DirectResponse { text: None });
    };

    let text = message.content.filter(|c| !c.trim().is_empty());

    let calls: Vec<RawToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| match tc.function {
            Some(f) => RawToolCall {
                name: f.name,
                arguments: f.arguments,
            },
            None => RawToolCall {
                name: None,
                arguments: None,
            },
        })
        .collect();

    if calls.is_empty() {
        Ok(ModelReply::DirectResponse { text })
    } else {
        Ok(ModelReply::ToolDirective {
            interim_text: text,
            calls,
        })
    }
}

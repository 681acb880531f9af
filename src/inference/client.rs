//! OpenAI-compatible inference client.
//!
//! Sends non-streaming chat completion requests to either the public OpenAI
//! API or an Azure OpenAI deployment and parses the reply into a
//! [`ModelReply`]. The [`ChatModel`] trait is the seam the orchestration
//! loop depends on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::errors::InferenceError;
use super::response::parse_completion;
use super::types::{ChatCompletionRequest, ChatMessage, ModelReply, ToolDefinition};
use crate::config::ModelConfig;
use crate::status::status_name;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Host fragment that identifies an Azure OpenAI resource.
const AZURE_HOST_MARKER: &str = "openai.azure.com";

// ─── Port ────────────────────────────────────────────────────────────────────

/// A chat model that can answer or direct tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one chat completion. When `tools` is `Some`, the request also
    /// carries `tool_choice: "auto"`.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ModelReply, InferenceError>;
}

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// How the client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    /// Azure: `api-key: <key>`.
    ApiKey(String),
    /// OpenAI: `Authorization: Bearer <key>`.
    Bearer(String),
}

/// Client for an OpenAI or Azure OpenAI chat completions endpoint.
pub struct InferenceClient {
    http: HttpClient,
    url: String,
    auth: Auth,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: u64,
}

impl InferenceClient {
    /// Create a client from the model configuration.
    ///
    /// Does NOT check connectivity; that happens on the first request.
    pub fn from_config(config: &ModelConfig) -> Result<Self, InferenceError> {
        let base = config.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(InferenceError::ConfigError {
                reason: "model base_url is empty".into(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed {
                endpoint: base.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let (url, auth, model) = if is_azure(base) {
            (
                format!(
                    "{base}/openai/deployments/{}/chat/completions?api-version={}",
                    config.deployment_name, config.api_version
                ),
                Auth::ApiKey(config.api_key.clone()),
                config.deployment_name.clone(),
            )
        } else {
            (
                format!("{base}/chat/completions"),
                Auth::Bearer(config.api_key.clone()),
                config.model_name.clone(),
            )
        };

        Ok(Self {
            http,
            url,
            auth,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    /// The resolved chat completions URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Model or deployment name sent with each request.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn is_azure(&self) -> bool {
        matches!(self.auth, Auth::ApiKey(_))
    }

    fn build_request(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                duration_secs: self.timeout_secs,
            }
        } else {
            InferenceError::ConnectionFailed {
                endpoint: self.url.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ModelReply, InferenceError> {
        let body = self.build_request(messages, tools);

        // Log the request metadata (not the full body)
        tracing::info!(
            url = %self.url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "=== LLM REQUEST ==="
        );

        let request = self.http.post(&self.url).json(&body);
        let request = match &self.auth {
            Auth::ApiKey(key) => request.header("api-key", key),
            Auth::Bearer(key) if !key.is_empty() => request.bearer_auth(key),
            Auth::Bearer(_) => request,
        };

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body_text, "model endpoint returned error");
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                status_name: status_name(status.as_u16()),
                body: body_text,
            });
        }

        let reply = parse_completion(&body_text)?;
        tracing::info!(
            tool_directive = reply.is_tool_directive(),
            has_text = reply.text().is_some(),
            "=== LLM RESPONSE ==="
        );
        Ok(reply)
    }
}

fn is_azure(base_url: &str) -> bool {
    base_url.to_ascii_lowercase().contains(AZURE_HOST_MARKER)
}

//! Shared test utilities and fixtures
//!
//! Mock function backend and model endpoint for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use mcp_chat::config::AppConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `GET mcp/functions` body advertising the two directory tools.
pub fn functions_body() -> serde_json::Value {
    serde_json::json!({
        "functions": [
            {
                "name": "get_app_registrations",
                "description": "Get a list of application registrations in the tenant",
                "parameters": {"type": "object", "properties": {}, "required": []}
            },
            {
                "name": "get_app_registration_details",
                "description": "Get details for a specific application registration",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "app_id": {"type": "string", "description": "The ID of the application registration"}
                    },
                    "required": ["app_id"]
                }
            }
        ]
    })
}

/// Mount `GET /mcp/functions`, expected exactly `times` times.
pub async fn mount_functions(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/mcp/functions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(functions_body()))
        .expect(times)
        .mount(server)
        .await;
}

/// A chat completion whose message is plain text.
pub fn text_completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// A chat completion directing one tool call.
pub fn tool_call_completion(name: &str, arguments: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

/// Mount `POST /v1/chat/completions` answering with `bodies` in order.
/// The last body repeats once the list is exhausted.
pub async fn mount_completions(server: &MockServer, bodies: Vec<serde_json::Value>) {
    let calls = AtomicUsize::new(0);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_: &wiremock::Request| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let body = bodies[n.min(bodies.len() - 1)].clone();
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(server)
        .await;
}

/// Config pointing both endpoints at `server`.
pub fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.tool_backend.base_url = server.uri();
    config.model.base_url = format!("{}/v1", server.uri());
    config.model.api_key = "test-key".into();
    config
}

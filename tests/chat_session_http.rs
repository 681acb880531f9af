//! End-to-end turns through `ChatSession` against mocked HTTP endpoints.

mod common;

use std::time::Duration;

use mcp_chat::inference::Role;
use mcp_chat::{ChatSession, RunStatus};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_apps_scenario() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/mcp/execute"))
        .and(body_partial_json(serde_json::json!({"name": "get_app_registrations"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"value":[{"id":"1","displayName":"App1"}]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    common::mount_completions(
        &server,
        vec![
            common::tool_call_completion("get_app_registrations", "{}"),
            common::text_completion("You have 1 application: App1"),
        ],
    )
    .await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("Which apps do I have?").await;

    assert_eq!(outcome.status, RunStatus::Completed);
    let roles: Vec<Role> = session.messages().iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Function, Role::Assistant]
    );
    let function = &session.messages()[3];
    assert_eq!(function.name(), Some("get_app_registrations"));
    assert_eq!(
        session.messages().last().unwrap().content(),
        "You have 1 application: App1"
    );
}

#[tokio::test]
async fn request_carries_auth_tools_and_function_name() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/mcp/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    // The follow-up request must include the named function result.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "tool_choice": "auto",
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "list"},
                {"role": "assistant", "content": "I need to look that up for you..."},
                {"role": "function", "name": "get_app_registrations", "content": "[]"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::text_completion("None found.")))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_completions(
        &server,
        vec![common::tool_call_completion("get_app_registrations", "{}")],
    )
    .await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("list").await;

    assert!(outcome.is_success());
    assert_eq!(session.messages().last().unwrap().content(), "None found.");
}

#[tokio::test]
async fn model_error_becomes_assistant_message() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
        .mount(&server)
        .await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("hi").await;

    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.status_code(), 500);
    assert_eq!(
        session.messages().last().unwrap().content(),
        "Error communicating with the language model: BadRequest, bad"
    );
}

#[tokio::test]
async fn null_completion_is_invalid_response() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    session.send_message("hi").await;

    assert_eq!(
        session.messages().last().unwrap().content(),
        "Invalid response from language model"
    );
}

#[tokio::test]
async fn completion_without_message_uses_placeholder() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    common::mount_completions(&server, vec![serde_json::json!({})]).await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("hi").await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.status_code(), 200);
    assert_eq!(
        session.messages().last().unwrap().content(),
        "I'm sorry, I couldn't generate a response."
    );
}

#[tokio::test]
async fn follow_up_without_message_uses_placeholder() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/mcp/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    common::mount_completions(
        &server,
        vec![
            common::tool_call_completion("get_app_registrations", "{}"),
            serde_json::json!({"choices": [{"message": null}]}),
        ],
    )
    .await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("list").await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(
        session.messages().last().unwrap().content(),
        "I'm sorry, I couldn't process that information."
    );
}

#[tokio::test]
async fn slow_model_hits_session_deadline() {
    let server = MockServer::start().await;
    common::mount_functions(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::text_completion("too late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = common::config_for(&server);
    config.orchestrator.session_deadline_secs = 1;
    let mut session = ChatSession::from_config(&config).unwrap();

    let outcome = session.send_message("hi").await;

    assert_eq!(outcome.status, RunStatus::TimedOut);
    assert_eq!(outcome.status_code(), 504);
    let timed_out = session
        .messages()
        .iter()
        .filter(|m| m.content() == "The request timed out. The server took too long to respond.")
        .count();
    assert_eq!(timed_out, 1);
}

#[tokio::test]
async fn unavailable_catalog_still_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp/functions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    common::mount_completions(&server, vec![common::text_completion("Hello!")]).await;

    let mut session = ChatSession::from_config(&common::config_for(&server)).unwrap();
    let outcome = session.send_message("hi").await;

    assert!(outcome.is_success());
    assert_eq!(session.messages().last().unwrap().content(), "Hello!");

    let requests = server.received_requests().await.unwrap();
    let completion = requests
        .iter()
        .find(|r| r.url.path() == "/v1/chat/completions")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&completion.body).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

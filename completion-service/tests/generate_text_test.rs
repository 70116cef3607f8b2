//! `/generate-text` integration tests.

mod common;

use axum::http::StatusCode;
use common::{eventually, TestApp};
use completion_service::config::GenerationConfig;
use completion_service::models::{ChatMessage, CompletionLog};
use completion_service::services::prompt::DEFAULT_SYSTEM_PROMPT;
use completion_service::services::providers::MockChatProvider;
use completion_service::services::MemoryLogStore;
use serde_json::json;

#[tokio::test]
async fn sends_text_before_cursor_and_trims_reply() {
    let app = TestApp::replying(" jumps.");

    let (status, body) = app
        .post_json(
            "/generate-text",
            json!({"text": "The quick brown fox", "cursorPosition": 9}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "jumps."}));

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].messages,
        vec![
            ChatMessage::system(DEFAULT_SYSTEM_PROMPT),
            ChatMessage::user("The quick"),
        ]
    );
    assert_eq!(calls[0].max_tokens, 250);
}

#[tokio::test]
async fn logs_completion_under_unknown_user_by_default() {
    let app = TestApp::replying("  over the lazy dog.\n");

    let (status, _) = app
        .post_json(
            "/generate-text",
            json!({"text": "The quick brown fox", "cursorPosition": 19}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let store = app.store();
    assert!(eventually(|| store.completions().len() == 1).await);
    assert_eq!(
        store.completions()[0],
        CompletionLog::new("unknown", "The quick brown fox", "over the lazy dog.")
    );
}

#[tokio::test]
async fn logs_completion_with_caller_user_id() {
    let app = TestApp::replying("continued");

    app.post_json(
        "/generate-text",
        json!({"text": "Dear team,", "cursorPosition": 4, "userId": "participant-7"}),
    )
    .await;

    let store = app.store();
    assert!(eventually(|| store.completions().len() == 1).await);
    assert_eq!(store.completions()[0].user_id, "participant-7");
    assert_eq!(store.completions()[0].input_text, "Dear");
}

#[tokio::test]
async fn out_of_range_cursor_is_clamped_not_rejected() {
    let app = TestApp::replying("ok");

    let (status, _) = app
        .post_json("/generate-text", json!({"text": "short", "cursorPosition": 99}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post_json("/generate-text", json!({"text": "short", "cursorPosition": -2}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let calls = app.provider.calls();
    assert_eq!(calls[0].messages[1].content, "short");
    assert_eq!(calls[1].messages[1].content, "sho");
}

#[tokio::test]
async fn provider_failure_returns_500_with_error_only() {
    let app = TestApp::failing("invalid api key");

    let (status, body) = app
        .post_json("/generate-text", json!({"text": "Hello", "cursorPosition": 5}))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("invalid api key"));
    assert!(body.get("response").is_none());
    assert!(app.store().completions().is_empty());
}

#[tokio::test]
async fn log_failure_does_not_affect_response() {
    let app = TestApp::build(
        MockChatProvider::replying("still fine"),
        Some(MemoryLogStore::failing()),
    );

    let (status, body) = app
        .post_json("/generate-text", json!({"text": "Hello", "cursorPosition": 5}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "still fine");
}

#[tokio::test]
async fn works_without_persistence() {
    let app = TestApp::build(MockChatProvider::replying("no store"), None);

    let (status, body) = app
        .post_json("/generate-text", json!({"text": "Hello", "cursorPosition": 5}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "no store");
}

#[tokio::test]
async fn configured_token_cap_and_prompt_are_used() {
    let app = TestApp::build_with_generation(
        MockChatProvider::replying("x"),
        None,
        GenerationConfig {
            system_prompt: "Continue in one sentence.".to_string(),
            completion_max_tokens: 50,
            chat_max_tokens: 150,
        },
    );

    app.post_json("/generate-text", json!({"text": "Hi", "cursorPosition": 2}))
        .await;

    let calls = app.provider.calls();
    assert_eq!(calls[0].max_tokens, 50);
    assert_eq!(calls[0].messages[0].content, "Continue in one sentence.");
}

#[tokio::test]
async fn missing_cursor_position_is_rejected_before_provider_call() {
    let app = TestApp::replying("unused");

    let (status, _) = app
        .post_json("/generate-text", json!({"text": "Hello"}))
        .await;

    assert!(status.is_client_error());
    assert!(app.provider.calls().is_empty());
}

//! Integration tests for `ChatCompletionClient` against a local wiremock
//! server. Covers the uniform happy path plus every way a backend can be
//! "unavailable": bad status, schema mismatch, empty choices, timeout.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aivis_visibility::{ChatCompletionClient, PlatformConfig, PlatformError, PlatformId};

fn config(base_url: &str) -> PlatformConfig {
    PlatformConfig {
        id: PlatformId::ChatGpt,
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        api_key: "sk-test".to_string(),
    }
}

#[tokio::test]
async fn complete_returns_the_first_choice_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "id": "cmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Summit Co is great." } }
            ],
            "usage": { "total_tokens": 12 }
        })))
        .mount(&server)
        .await;

    let client = ChatCompletionClient::new(5).expect("client builds");
    let reply = client
        .complete(&config(&server.uri()), "best hiking packs?")
        .await
        .expect("completion succeeds");

    assert_eq!(reply.text, "Summit Co is great.");
}

#[tokio::test]
async fn request_carries_model_prompt_and_bearer_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [ { "role": "user", "content": "best hiking packs?" } ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "choices": [ { "message": { "role": "assistant", "content": "ok" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatCompletionClient::new(5).expect("client builds");
    client
        .complete(&config(&server.uri()), "best hiking packs?")
        .await
        .expect("completion succeeds");
}

#[tokio::test]
async fn non_success_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1) // no retries inside the adapter
        .mount(&server)
        .await;

    let client = ChatCompletionClient::new(5).expect("client builds");
    let result = client.complete(&config(&server.uri()), "q").await;

    match result {
        Err(PlatformError::Unavailable { platform, reason }) => {
            assert_eq!(platform, PlatformId::ChatGpt);
            assert!(reason.contains("503"), "reason was: {reason}");
        }
        other => panic!("expected Unavailable, got: {other:?}"),
    }
}

#[tokio::test]
async fn schema_mismatch_fails_closed() {
    let server = MockServer::start().await;

    // 200 with a shape that has no choices[].message.content.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({ "unexpected": "shape" })),
        )
        .mount(&server)
        .await;

    let client = ChatCompletionClient::new(5).expect("client builds");
    let result = client.complete(&config(&server.uri()), "q").await;

    assert!(matches!(result, Err(PlatformError::Unavailable { .. })));
}

#[tokio::test]
async fn empty_choice_list_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = ChatCompletionClient::new(5).expect("client builds");
    let result = client.complete(&config(&server.uri()), "q").await;

    match result {
        Err(PlatformError::Unavailable { reason, .. }) => {
            assert!(reason.contains("no choices"), "reason was: {reason}");
        }
        other => panic!("expected Unavailable, got: {other:?}"),
    }
}

#[tokio::test]
async fn slow_backend_times_out_as_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({
                    "choices": [ { "message": { "role": "assistant", "content": "late" } } ]
                }))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    // 1-second budget against a 5-second backend.
    let client = ChatCompletionClient::new(1).expect("client builds");
    let result = client.complete(&config(&server.uri()), "q").await;

    match result {
        Err(PlatformError::Unavailable { reason, .. }) => {
            assert!(reason.contains("timed out"), "reason was: {reason}");
        }
        other => panic!("expected timeout Unavailable, got: {other:?}"),
    }
}

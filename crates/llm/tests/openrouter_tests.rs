use std::time::Duration;

use llm::{ChatMessage, CompletionRequest, LlmError, OpenRouterClient, ReasoningService, RetryPolicy};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new("test-key".to_string(), server.uri()).with_retry_policy(
        RetryPolicy::default().with_initial_backoff(Duration::from_millis(1)),
    )
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn vote_request() -> CompletionRequest {
    CompletionRequest::new("openai/gpt-4o-mini", vec![ChatMessage::user("Who do you vote for?")])
        .with_schema(
            "vote",
            json!({
                "type": "object",
                "properties": { "target": { "type": "string" } },
                "required": ["target"]
            }),
        )
        .with_temperature(0.7)
        .with_label("voting")
}

#[tokio::test]
async fn test_structured_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-4o-mini",
            "response_format": { "type": "json_schema", "json_schema": { "name": "vote" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            r#"{"target": "Bob", "reason": "quiet all day"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server);
    let completion = client
        .complete(vote_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(completion.structured.unwrap()["target"], "Bob");
}

#[tokio::test]
async fn test_plain_completion_has_no_structured_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{\"a\": 1}")))
        .mount(&server)
        .await;

    let request = CompletionRequest::new("m", vec![ChatMessage::user("talk")]);
    let completion = fast_client(&server)
        .complete(request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(completion.content, "{\"a\": 1}");
    assert!(completion.structured.is_none());
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(r#"{"target":"Cara"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let completion = fast_client(&server)
        .complete(vote_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(completion.structured.unwrap()["target"], "Cara");
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "message": "overloaded", "type": "server_error" }
        })))
        .expect(4)
        .mount(&server)
        .await;

    let result = fast_client(&server)
        .complete(vote_request(), &CancellationToken::new())
        .await;

    match result {
        Err(LlmError::Api { message, status_code }) => {
            assert_eq!(message, "overloaded");
            assert_eq!(status_code, Some(503));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fast_client(&server)
        .complete(vote_request(), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(LlmError::Api {
            status_code: Some(400),
            ..
        })
    ));
}

#[tokio::test]
async fn test_empty_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;

    let result = fast_client(&server)
        .complete(vote_request(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LlmError::EmptyResponse { .. })));
}

#[tokio::test]
async fn test_cancelled_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hi")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fast_client(&server).complete(vote_request(), &cancel).await;
    assert!(matches!(result, Err(LlmError::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_during_slow_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = fast_client(&server).complete(vote_request(), &cancel).await;
    assert!(matches!(result, Err(LlmError::Cancelled)));
}

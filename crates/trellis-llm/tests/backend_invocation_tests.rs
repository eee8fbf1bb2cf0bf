//! Integration tests for the outbound invocation path against a mocked
//! OpenAI-compatible endpoint.

use std::collections::HashMap;
use std::time::Duration;

use trellis_llm::{
    BackendError, InvokeParams, ModelCatalog, ModelDescriptor, ModelRouter, ProviderKind,
    WireMessage,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn router_for(server: &MockServer, provider: ProviderKind) -> ModelRouter {
    let catalog = ModelCatalog::new(
        "maverick",
        vec![ModelDescriptor {
            alias: "maverick".to_string(),
            provider,
            base_url: server.uri(),
            credential_env: "TEST_TOKEN".to_string(),
            model_id: "databricks-llama-4-maverick".to_string(),
        }],
    );
    let credentials = HashMap::from([("TEST_TOKEN".to_string(), "secret-token".to_string())]);
    ModelRouter::new(catalog, credentials)
}

fn quick_params() -> InvokeParams {
    InvokeParams {
        max_tokens: 256,
        temperature: 0.2,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn invoke_sends_bearer_and_parses_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(body_partial_json(serde_json::json!({
            "model": "databricks-llama-4-maverick",
            "max_tokens": 256
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello there!"}}],
            "usage": {"prompt_tokens": 14, "completion_tokens": 6}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::Databricks);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];

    let outcome = router
        .invoke(&route, &messages, &quick_params())
        .await
        .unwrap();

    assert_eq!(outcome.text, "Hello there!");
    assert_eq!(outcome.usage.tokens_in, 14);
    assert_eq!(outcome.usage.tokens_out, 6);
}

#[tokio::test]
async fn rate_limited_status_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error_code": "REQUEST_LIMIT_EXCEEDED", "message": "Too many requests"}"#,
        ))
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::Databricks);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];

    let err = router
        .invoke(&route, &messages, &quick_params())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BackendError::RateLimited(detail) if detail.contains("Too many requests")
    ));
}

#[tokio::test]
async fn auth_rejection_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        ))
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::OpenAi);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];

    let err = router
        .invoke(&route, &messages, &quick_params())
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::AuthRejected { status: 401, .. }));
}

#[tokio::test]
async fn missing_usage_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "no usage here"}}]
        })))
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::Compatible);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];

    let err = router
        .invoke(&route, &messages, &quick_params())
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::MalformedResponse(_)));
}

#[tokio::test]
async fn timed_out_invocation_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "choices": [{"message": {"content": "late"}}],
                    "usage": {"prompt_tokens": 1, "completion_tokens": 1}
                }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::Databricks);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];
    let params = InvokeParams {
        timeout: Duration::from_millis(50),
        ..quick_params()
    };

    let err = router.invoke(&route, &messages, &params).await.unwrap_err();

    assert!(matches!(err, BackendError::Timeout(_)));
}

#[tokio::test]
async fn server_error_carries_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server, ProviderKind::Compatible);
    let route = router.resolve("maverick").unwrap();
    let messages = vec![WireMessage::user("hi")];

    let err = router
        .invoke(&route, &messages, &quick_params())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BackendError::Api { status: 500, detail } if detail.contains("upstream exploded")
    ));
}

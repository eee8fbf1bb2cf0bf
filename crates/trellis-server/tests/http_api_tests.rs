//! HTTP surface tests: real handlers, real dispatcher, mocked backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::Value;
use trellis_dispatch::{DispatchConfig, Dispatcher};
use trellis_llm::{ModelCatalog, ModelDescriptor, ModelRouter, ProviderKind};
use trellis_metrics::MetricsAggregator;
use trellis_server::{app_config, AppState};
use trellis_store::{SessionStore, StoreConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptor(alias: &str, model_id: &str, server: &MockServer) -> ModelDescriptor {
    ModelDescriptor {
        alias: alias.to_string(),
        provider: ProviderKind::Compatible,
        base_url: server.uri(),
        credential_env: "TEST_TOKEN".to_string(),
        model_id: model_id.to_string(),
    }
}

fn state_with_credentials(
    server: &MockServer,
    credentials: HashMap<String, String>,
    request_timeout: Duration,
) -> AppState {
    let catalog = ModelCatalog::new(
        "model-a",
        vec![
            descriptor("model-a", "backend-model-a", server),
            descriptor("model-b", "backend-model-b", server),
        ],
    );
    let store = Arc::new(SessionStore::new(StoreConfig {
        default_alias: "model-a".to_string(),
        max_turns: 40,
    }));
    let router = Arc::new(ModelRouter::new(catalog, credentials));
    let metrics = Arc::new(MetricsAggregator::new());
    let config = DispatchConfig {
        request_timeout,
        ..Default::default()
    };
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        router.clone(),
        metrics.clone(),
        config,
    ));
    AppState::new(store, router, metrics, dispatcher, false)
}

fn state_for(server: &MockServer) -> AppState {
    let credentials = HashMap::from([("TEST_TOKEN".to_string(), "secret-token".to_string())]);
    state_with_credentials(server, credentials, Duration::from_secs(5))
}

fn reply_body(content: &str, tokens_in: u64, tokens_out: u64) -> Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": tokens_in, "completion_tokens": tokens_out}
    })
}

async fn mount_success(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(content, 10, 5)))
        .mount(server)
        .await;
}

#[actix_web::test]
async fn chat_returns_reply_and_metrics_count_it() {
    let mock_server = MockServer::start().await;
    mount_success(&mock_server, "Hello from the backend").await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({
            "thread_id": "t-1",
            "message": "hi",
            "user_id": "u-1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["response"], "Hello from the backend");
    assert_eq!(body["model"], "backend-model-a");
    assert_eq!(body["thread_id"], "t-1");
    assert!(body["timestamp"].is_string());

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let metrics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(metrics["totalRequests"], 1);
    assert_eq!(metrics["failedRequests"], 0);
    assert_eq!(metrics["totalTokensIn"], 10);
    assert_eq!(metrics["uniqueUsers"], 1);
    assert_eq!(metrics["activeConversations"], 1);
    assert_eq!(metrics["perModel"]["model-a"]["requests"], 1);
}

#[actix_web::test]
async fn chat_with_unknown_model_is_a_bad_request() {
    let mock_server = MockServer::start().await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({
            "thread_id": "t-2",
            "message": "hi",
            "model": "nope"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "unknown_model");
    assert!(body["error"]["message"].as_str().unwrap().contains("nope"));
}

#[actix_web::test]
async fn chat_timeout_maps_to_gateway_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply_body("too late", 1, 1))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;
    let credentials = HashMap::from([("TEST_TOKEN".to_string(), "secret-token".to_string())]);
    let state = state_with_credentials(&mock_server, credentials, Duration::from_millis(100));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({"thread_id": "t-3", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "timeout");
}

#[actix_web::test]
async fn missing_credentials_surface_as_server_error() {
    let mock_server = MockServer::start().await;
    let state = state_with_credentials(&mock_server, HashMap::new(), Duration::from_secs(5));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({"thread_id": "t-4", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "missing_credential");
}

#[actix_web::test]
async fn models_lists_catalog_and_default() {
    let mock_server = MockServer::start().await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::get().uri("/models").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["default"], "model-a");
    assert_eq!(body["models"]["model-a"], "backend-model-a");
    assert_eq!(body["models"]["model-b"], "backend-model-b");
}

#[actix_web::test]
async fn clear_reports_cleared_then_not_found() {
    let mock_server = MockServer::start().await;
    mount_success(&mock_server, "ok").await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({"thread_id": "t-5", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/clear/t-5").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "cleared");
    assert_eq!(body["thread_id"], "t-5");

    let req = test::TestRequest::post().uri("/clear/absent").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "not_found");
}

#[actix_web::test]
async fn health_reports_status_and_configuration() {
    let mock_server = MockServer::start().await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend_configured"], true);
    assert_eq!(body["platform_configured"], false);
    assert_eq!(body["active_conversations"], 0);
    assert_eq!(body["requests"], 0);
    assert_eq!(body["users"], 0);
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}

#[actix_web::test]
async fn dashboard_renders_without_placeholders() {
    let mock_server = MockServer::start().await;
    mount_success(&mock_server, "ok").await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({"thread_id": "t-6", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/html"));

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Trellis"));
    assert!(html.contains("model-a"));
    assert!(!html.contains("{{"), "unfilled placeholder in dashboard");
}

#[actix_web::test]
async fn metrics_reset_zeroes_counters() {
    let mock_server = MockServer::start().await;
    mount_success(&mock_server, "ok").await;
    let state = state_for(&mock_server);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(serde_json::json!({"thread_id": "t-7", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let metrics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(metrics["totalRequests"], 1);

    let req = test::TestRequest::post().uri("/metrics/reset").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "reset");

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let metrics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(metrics["totalRequests"], 0);
    // Conversations survive a metrics reset.
    assert_eq!(metrics["activeConversations"], 1);
}

//! End-to-end tests driving the extraction and analysis pipeline through
//! the HTTP router against a mocked provider backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use threadlens::analyzer::Analyzer;
use threadlens::cache::AnalysisCache;
use threadlens::config::{Config, EndpointsConfig};
use threadlens::server::{AppState, create_router};
use threadlens::testing::{sample_analysis_json, INBOX_URL, THREAD_PAGE, THREAD_URL};

fn app_for(base_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        endpoints: EndpointsConfig::all_overridden(base_url),
        ..Config::default()
    };
    let cache = Arc::new(AnalysisCache::new(config.cache.capacity));
    let analyzer = Analyzer::new(&config.server, config.endpoints.clone(), cache.clone())
        .expect("analyzer builds");
    let state = Arc::new(AppState { analyzer, cache });
    (create_router(state.clone()), state)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn openai_reply() -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"content": sample_analysis_json().to_string()}}]
    })
}

#[tokio::test]
async fn analyze_page_end_to_end_caches_by_derived_thread_id() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply()))
        .expect(1)
        .mount(&provider)
        .await;

    let (app, state) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/analyze",
            serde_json::json!({
                "page": {"html": THREAD_PAGE, "url": THREAD_URL},
                "settings": {"aiProvider": "openai", "apiKey": "sk-test"},
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"], sample_analysis_json());

    // The thread id came from the page URL fragment.
    let cached = state.cache.get("4a5b6c").expect("entry cached");
    assert_eq!(cached.thread_id, "4a5b6c");

    // The cached entry is readable through the side panel's route.
    let app = create_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analysis/4a5b6c")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["threadId"], "4a5b6c");
    assert_eq!(body["analysis"], sample_analysis_json());
    assert!(body.get("timestamp").is_some());
}

#[tokio::test]
async fn analyze_with_explicit_messages_uses_given_thread_id() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply()))
        .mount(&provider)
        .await;

    let (app, state) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/analyze",
            serde_json::json!({
                "threadId": "feed42",
                "messages": [
                    {"sender": "a@x.com", "timestamp": "t1", "body": "Let's ship Friday.", "index": 0},
                    {"sender": "b@x.com", "timestamp": "t2", "body": "Agreed, I'll update the doc by Thursday.", "index": 1},
                ],
                "settings": {"aiProvider": "openai", "apiKey": "sk-test"},
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.cache.get("feed42").is_some());

    // The provider saw both message bodies in one prompt.
    let requests = provider.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(sent.contains("Let's ship Friday."));
    assert!(sent.contains("From: a@x.com"));
}

#[tokio::test]
async fn analyze_with_empty_api_key_never_touches_provider() {
    let provider = MockServer::start().await;
    let (app, state) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/analyze",
            serde_json::json!({
                "page": {"html": THREAD_PAGE, "url": THREAD_URL},
                "settings": {"aiProvider": "openai", "apiKey": ""},
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AI provider and API key are required");
    assert!(provider.received_requests().await.unwrap().is_empty());
    assert!(state.cache.is_empty());
}

#[tokio::test]
async fn provider_http_error_surfaces_as_bad_gateway_with_message() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(
            serde_json::json!({"error": {"message": "Rate limit reached for requests"}}),
        ))
        .mount(&provider)
        .await;

    let (app, _) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/analyze",
            serde_json::json!({
                "page": {"html": THREAD_PAGE, "url": THREAD_URL},
                "settings": {"aiProvider": "openai", "apiKey": "sk-test"},
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Rate limit reached for requests");
}

#[tokio::test]
async fn test_connection_route_reports_provider_error_body() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({"type": "error", "error": {"message": "invalid x-api-key"}}),
        ))
        .mount(&provider)
        .await;

    let (app, _) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/test-connection",
            serde_json::json!({"provider": "claude", "apiKey": "sk-bad"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid x-api-key");
}

#[tokio::test]
async fn test_connection_route_success_envelope() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&provider)
        .await;

    let (app, _) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/test-connection",
            serde_json::json!({"provider": "openai", "apiKey": "sk-test"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"], "Connection successful");
}

#[tokio::test]
async fn invalid_model_output_is_a_terminal_error_not_partial_data() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "Sure, here's a summary in prose."}}]
        })))
        .mount(&provider)
        .await;

    let (app, state) = app_for(&provider.uri());

    let response = app
        .oneshot(json_request(
            "/api/analyze",
            serde_json::json!({
                "page": {"html": THREAD_PAGE, "url": THREAD_URL},
                "settings": {"aiProvider": "openai", "apiKey": "sk-test"},
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Invalid response format from OpenAI"));
    assert!(state.cache.is_empty());
}

#[tokio::test]
async fn thread_info_route_distinguishes_views() {
    let (app, _) = app_for("http://127.0.0.1:0");

    let response = app
        .oneshot(json_request(
            "/api/thread-info",
            serde_json::json!({"html": "<html><body><div role=\"main\"></div></body></html>", "url": INBOX_URL}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["isInThread"], false);
}

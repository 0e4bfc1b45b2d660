// tests/llm_http.rs
//
// Generators and HTTP-mode sources against an in-process axum server.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use blog_autodraft::config::{LlmProvider, LlmSettings};
use blog_autodraft::fetch_all_trends;
use blog_autodraft::synth::llm::{build_generator, TextGenerator};
use blog_autodraft::trends::providers::hackernews::HackerNewsProvider;
use blog_autodraft::trends::types::TrendSource;
use blog_autodraft::GenerationError;
use serde_json::{json, Value};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn settings(provider: LlmProvider, base_url: String) -> LlmSettings {
    LlmSettings {
        provider,
        api_key: "test-key".into(),
        model: "test-model".into(),
        max_tokens: 256,
        timeout: Duration::from_secs(5),
        base_url,
    }
}

async fn anthropic_ok(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let key_ok = headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("test-key");
    let version_ok = headers.get("anthropic-version").is_some();
    if !(key_ok && version_ok) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad auth"})));
    }
    let echoed = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "generated: "},
                {"type": "text", "text": echoed},
            ],
            "model": body["model"],
            "max_tokens_seen": body["max_tokens"],
        })),
    )
}

#[tokio::test]
async fn anthropic_success_concatenates_text_blocks() {
    let base = spawn(Router::new().route("/v1/messages", post(anthropic_ok))).await;
    let generator = build_generator(&settings(LlmProvider::Anthropic, base)).unwrap();
    let out = generator.generate("hello").await.unwrap();
    assert_eq!(out, "generated: hello");
    assert_eq!(generator.name(), "anthropic");
}

#[tokio::test]
async fn non_2xx_is_upstream_error() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = spawn(app).await;
    let generator = build_generator(&settings(LlmProvider::Anthropic, base)).unwrap();
    match generator.generate("x").await {
        Err(GenerationError::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_envelope_is_rejected() {
    let app = Router::new()
        .route("/v1/messages", post(|| async { "this is not json" }))
        .route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
    let base = spawn(app).await;

    let anthropic = build_generator(&settings(LlmProvider::Anthropic, base.clone())).unwrap();
    assert!(matches!(
        anthropic.generate("x").await,
        Err(GenerationError::Envelope(_))
    ));

    let openai = build_generator(&settings(LlmProvider::OpenAi, base)).unwrap();
    assert!(matches!(
        openai.generate("x").await,
        Err(GenerationError::Envelope(_))
    ));
}

#[tokio::test]
async fn openai_uses_bearer_auth() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|headers: HeaderMap| async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({"choices": [{"message": {"role": "assistant", "content": auth}}]}))
        }),
    );
    let base = spawn(app).await;
    let generator = build_generator(&settings(LlmProvider::OpenAi, base)).unwrap();
    assert_eq!(generator.generate("x").await.unwrap(), "Bearer test-key");
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let generator =
        build_generator(&settings(LlmProvider::Anthropic, format!("http://{addr}"))).unwrap();
    assert!(matches!(
        generator.generate("x").await,
        Err(GenerationError::Transport(_))
    ));
}

#[tokio::test]
async fn http_source_failure_degrades_to_empty_group() {
    let app = Router::new()
        .route(
            "/ok",
            get(|| async {
                Json(json!({"hits": [{"title": "Live item", "url": "https://x.test", "points": 5, "objectID": "1"}]}))
            }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
    let base = spawn(app).await;
    let client = reqwest::Client::new();

    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(HackerNewsProvider::from_url(format!("{base}/down"), client.clone())),
        Box::new(HackerNewsProvider::from_url(format!("{base}/ok"), client)),
    ];
    let batch = fetch_all_trends(&sources, Duration::from_secs(5), 10).await;

    assert_eq!(batch.groups.len(), 2);
    assert!(batch.groups[0].records.is_empty());
    assert!(batch.groups[0].failed());
    assert_eq!(batch.groups[1].records.len(), 1);
    assert_eq!(batch.groups[1].records[0].title, "Live item");
}

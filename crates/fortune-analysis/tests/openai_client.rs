//! Integration tests for `OpenAiClient` using wiremock HTTP mocks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use fortune_analysis::{GenerationError, OpenAiClient, TextGenerator};
use fortune_core::{AppConfig, Environment, FallbackStats};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_retries: u32) -> OpenAiClient {
    OpenAiClient::with_base_url("test-key", "gpt-3.5-turbo", 30, max_retries, base_url)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0)
}

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn complete_returns_trimmed_message_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 150,
            "messages": [{ "role": "user", "content": "Analyze this" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Strong hook.\n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let text = client
        .complete("Analyze this", 150, 0.7)
        .await
        .expect("completion should succeed");

    assert_eq!(text, "Strong hook.");
}

#[tokio::test]
async fn complete_maps_client_error_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client.complete("p", 10, 0.5).await.unwrap_err();

    match err {
        GenerationError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let text = client.complete("p", 10, 0.5).await.expect("should recover");

    assert_eq!(text, "Recovered");
}

#[tokio::test]
async fn complete_reports_rate_limit_after_retries_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client.complete("p", 10, 0.5).await.unwrap_err();

    assert!(
        matches!(err, GenerationError::RateLimited { retry_after_secs: None }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn complete_rejects_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client.complete("p", 10, 0.5).await.unwrap_err();

    assert!(matches!(err, GenerationError::Malformed(_)), "got {err:?}");
}

fn app_config(base_url: &str, generation_timeout_secs: u64, max_retries: u32) -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/fortune_test".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
        log_level: "info".to_string(),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        max_posts_per_analysis: 10,
        cache_analysis_days: 30,
        portrait_fallback_stats: FallbackStats::Zeroed,
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: base_url.to_string(),
        openai_model: "gpt-3.5-turbo".to_string(),
        generation_timeout_secs,
        generation_max_retries: max_retries,
        threads_access_token: None,
        threads_user_id: None,
        sync_limit: 50,
        http_timeout_secs: 30,
        rate_limit_max_requests: 120,
        rate_limit_window_secs: 60,
    }
}

/// A hung first attempt is cut short so the retry still lands inside the
/// caller's generation timeout.
#[tokio::test]
async fn hung_attempt_is_retried_within_generation_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(10)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let config = app_config(&server.uri(), 3, 2);
    let client = OpenAiClient::from_app_config("test-key", &config)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0);

    let text = tokio::time::timeout(
        Duration::from_secs(config.generation_timeout_secs),
        client.complete("p", 10, 0.5),
    )
    .await
    .expect("finished before the generation timeout")
    .expect("second attempt should succeed");

    assert_eq!(text, "recovered");
}

#[tokio::test]
async fn budget_bounds_total_time_when_every_attempt_hangs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("never"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let config = app_config(&server.uri(), 2, 1);
    let client = OpenAiClient::from_app_config("test-key", &config)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0);

    let started = std::time::Instant::now();
    let err = client.complete("p", 10, 0.5).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert!(matches!(err, GenerationError::Http(_)), "got {err:?}");
    assert_eq!(server.received_requests().await.map_or(0, |r| r.len()), 2);
}

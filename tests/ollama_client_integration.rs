//! Integration tests for the Ollama client against a local fake backend.
//!
//! Each test starts an axum server on an ephemeral port that answers the
//! probe and `/api/generate` the way the scenario needs.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use attendify_assistant::adapters::generation::{OllamaClient, OllamaConfig, UNREACHABLE_MESSAGE};
use attendify_assistant::ports::{Fragment, GenerationError, GenerationRequest, TextGenerator};

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Clone, Copy)]
enum Scenario {
    /// 500 for the first `n` calls, then a reply.
    FailThenSucceed(u32),
    AlwaysFail,
    BadRequest,
    Stream,
    /// Answers only after 30 seconds.
    Slow,
}

#[derive(Clone)]
struct Fake {
    scenario: Scenario,
    calls: Arc<AtomicU32>,
    last_body: Arc<std::sync::Mutex<Option<Value>>>,
}

async fn generate(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    let call = fake.calls.fetch_add(1, Ordering::SeqCst) + 1;
    *fake.last_body.lock().unwrap() = Some(body);

    match fake.scenario {
        Scenario::FailThenSucceed(n) if call <= n => {
            (StatusCode::INTERNAL_SERVER_ERROR, "model loading").into_response()
        }
        Scenario::FailThenSucceed(_) => {
            Json(json!({"response": "You are at 92%.", "done": true})).into_response()
        }
        Scenario::AlwaysFail => (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response(),
        Scenario::BadRequest => (StatusCode::BAD_REQUEST, "unknown model").into_response(),
        Scenario::Slow => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({"response": "late", "done": true})).into_response()
        }
        Scenario::Stream => {
            let lines = vec![
                "{\"response\":\"Hel\",\"done\":false}\n{\"resp".to_string(),
                "onse\":\"lo\",\"done\":false}\n".to_string(),
                "{\"response\":\" world\",\"done\":false}\n".to_string(),
                "{\"response\":\"\",\"done\":true}\n".to_string(),
            ];
            let body = stream::iter(lines.into_iter().map(Ok::<_, Infallible>));
            Response::new(Body::from_stream(body))
        }
    }
}

async fn spawn_backend(scenario: Scenario) -> (String, Fake) {
    let fake = Fake {
        scenario,
        calls: Arc::new(AtomicU32::new(0)),
        last_body: Arc::new(std::sync::Mutex::new(None)),
    };
    let app = Router::new()
        .route("/", get(|| async { "Ollama is running" }))
        .route("/api/generate", post(generate))
        .with_state(fake.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), fake)
}

/// Address with nothing listening on it.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn config(base_url: &str) -> OllamaConfig {
    OllamaConfig::new("http://localhost:11434", "llama3.2:3b")
        .with_base_url(base_url)
        .with_model("test-model")
        .with_generate_timeout(Duration::from_secs(10))
        .with_stream_timeout(Duration::from_secs(10))
}

fn client(base_url: &str) -> OllamaClient {
    OllamaClient::new(config(base_url)).unwrap()
}

// =============================================================================
// Buffered generation
// =============================================================================

#[tokio::test]
async fn retries_with_backoff_until_success() {
    let (base, fake) = spawn_backend(Scenario::FailThenSucceed(2)).await;
    let client = client(&base);

    let started = Instant::now();
    let reply = client
        .generate(GenerationRequest::new("How is my attendance?"))
        .await
        .unwrap();

    assert_eq!(reply, "You are at 92%.");
    assert_eq!(fake.calls.load(Ordering::SeqCst), 3);
    // 200ms then 500ms between the three attempts
    assert!(started.elapsed() >= Duration::from_millis(700));
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let (base, fake) = spawn_backend(Scenario::AlwaysFail).await;
    let client = OllamaClient::new(config(&base).with_backoff(vec![Duration::from_millis(10)])).unwrap();

    let err = client
        .generate(GenerationRequest::new("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Exhausted { attempts: 3, .. }));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (base, fake) = spawn_backend(Scenario::BadRequest).await;

    let err = client(&base)
        .generate(GenerationRequest::new("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Status { status: 400, .. }));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sends_model_and_sampling_options() {
    let (base, fake) = spawn_backend(Scenario::FailThenSucceed(0)).await;

    client(&base)
        .generate(GenerationRequest::new("prompt text").with_max_tokens(64))
        .await
        .unwrap();

    let body = fake.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["prompt"], "prompt text");
    assert_eq!(body["stream"], false);
    assert_eq!(body["options"]["num_predict"], 64);
}

#[tokio::test]
async fn unreachable_backend_fails_without_sending() {
    let base = dead_address().await;

    let err = client(&base)
        .generate(GenerationRequest::new("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Unreachable(_)));
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn stream_reassembles_split_lines() {
    let (base, _fake) = spawn_backend(Scenario::Stream).await;

    let fragments: Vec<Fragment> = client(&base)
        .stream_generate(GenerationRequest::new("hi"))
        .collect()
        .await;

    assert_eq!(
        fragments,
        vec![
            Fragment::Text("Hel".into()),
            Fragment::Text("lo".into()),
            Fragment::Text(" world".into()),
        ]
    );
}

#[tokio::test]
async fn stream_to_unreachable_backend_yields_one_error() {
    let base = dead_address().await;

    let fragments: Vec<Fragment> = client(&base)
        .stream_generate(GenerationRequest::new("hi"))
        .collect()
        .await;

    assert_eq!(fragments, vec![Fragment::error(UNREACHABLE_MESSAGE)]);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_backend_and_model() {
    let (base, fake) = spawn_backend(Scenario::Stream).await;

    let health = client(&base).health_check().await;

    assert!(health.ok);
    assert_eq!(health.base_url, base);
    assert_eq!(health.model, "test-model");
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generate_timeout_bounds_each_attempt() {
    let (base, fake) = spawn_backend(Scenario::Slow).await;
    let client = OllamaClient::new(
        config(&base)
            .with_max_attempts(2)
            .with_backoff(vec![Duration::from_millis(10)])
            .with_generate_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let started = Instant::now();
    let err = client
        .generate(GenerationRequest::new("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Exhausted { attempts: 2, .. }));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn health_down_when_nothing_listens() {
    let health = client(&dead_address().await).health_check().await;
    assert!(!health.ok);
}

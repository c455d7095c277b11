use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use idea_validator_core::api::ErrorBody;
use idea_validator_core::{ValidationResult, ValidatorError, ValidatorResult};
use idea_validator_daemon::config::DaemonConfig;
use idea_validator_daemon::http::router;
use idea_validator_daemon::llm::{CompletionClient, CompletionOptions};
use idea_validator_daemon::service::ValidationService;
use serde_json::json;
use tower::ServiceExt;

enum Script {
    Reply(String),
    Fail(fn() -> ValidatorError),
    Hang,
}

/// In-memory stand-in for the model service.
struct ScriptedClient {
    script: Script,
    configured: bool,
    calls: AtomicUsize,
    last_input: std::sync::Mutex<Option<String>>,
    dropped: Arc<AtomicBool>,
}

impl ScriptedClient {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            configured: true,
            calls: AtomicUsize::new(0),
            last_input: std::sync::Mutex::new(None),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            script: Script::Hang,
            configured: false,
            calls: AtomicUsize::new(0),
            last_input: std::sync::Mutex::new(None),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, input: &str, _opts: &CompletionOptions) -> ValidatorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(make) => Err(make()),
            Script::Hang => {
                let _guard = SetOnDrop(Arc::clone(&self.dropped));
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

fn app(client: Arc<ScriptedClient>, dev_mode: bool) -> Router {
    let config = DaemonConfig {
        request_timeout: Duration::from_millis(100),
        dev_mode,
        ..Default::default()
    };
    let svc = Arc::new(ValidationService::new(client, &config));
    router(svc, config.dev_mode)
}

fn post_json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/validate-idea")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn sentinel_reply() -> String {
    let risk = json!({ "risk": "-", "level": "-", "reason": "-" });
    let comp = json!({ "competitor": "-", "weakness": "-" });
    let body = json!({
        "summary": "-",
        "evaluation": {
            "market": { "sizeEstimation": "-", "targetUsers": ["-"], "painPoints": "-" },
            "differentiation": {
                "uniqueValue": "-",
                "competitiveLandscape": [comp, comp, comp],
                "strengths": ["-"],
                "weaknesses": ["-"]
            },
            "risk": {
                "technical": [risk, risk, risk],
                "market": [risk, risk, risk],
                "regulatory": [risk, risk, risk],
                "financial": [risk, risk, risk]
            },
            "feasibility": { "score": 1, "scale": 5, "justification": "-" }
        },
        "recommendations": ["-"]
    });
    format!("```json\n{body}\n```")
}

#[tokio::test]
async fn valid_reply_returns_result() {
    let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
    let idea = "모바일 반려동물 건강관리 앱";
    let (status, body) = send(app(client.clone(), false), post_json(json!({ "idea": idea }))).await;

    assert_eq!(status, StatusCode::OK);
    let result: ValidationResult = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.summary, "-");
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    let input = client.last_input.lock().unwrap().clone().unwrap();
    assert!(input.ends_with(idea));
}

#[tokio::test]
async fn blank_idea_is_rejected_before_remote_call() {
    for idea in ["", "   \n\t"] {
        let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
        let (status, body) =
            send(app(client.clone(), false), post_json(json!({ "idea": idea }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "invalid_input");
        assert_eq!(err.error, "아이디어를 입력해주세요.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn missing_idea_field_is_invalid_input() {
    let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
    let (status, _) = send(app(client.clone(), false), post_json(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn garbage_body_is_invalid_input() {
    let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
    let req = Request::builder()
        .method("POST")
        .uri("/api/validate-idea")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(client, false), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "invalid_input");
}

#[tokio::test]
async fn oversized_idea_is_rejected() {
    let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
    let idea = "가".repeat(2001);
    let (status, _) = send(app(client.clone(), false), post_json(json!({ "idea": idea }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn other_methods_get_405() {
    let client = ScriptedClient::new(Script::Reply(sentinel_reply()));
    let req = Request::builder()
        .method("GET")
        .uri("/api/validate-idea")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(client, false), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "Method Not Allowed");
}

#[tokio::test]
async fn missing_credential_is_configuration_error() {
    let client = ScriptedClient::unconfigured();
    let (status, body) =
        send(app(client.clone(), false), post_json(json!({ "idea": "x" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "configuration_error");
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_failures_map_to_500_with_their_messages() {
    let cases: [(fn() -> ValidatorError, &str); 3] = [
        (|| ValidatorError::AuthFailure, "auth_failure"),
        (|| ValidatorError::RateLimitExceeded, "rate_limit_exceeded"),
        (
            || ValidatorError::RemoteRequest("Unsupported tool".into()),
            "remote_request_error",
        ),
    ];
    for (make, code) in cases {
        let client = ScriptedClient::new(Script::Fail(make));
        let (status, body) = send(app(client, false), post_json(json!({ "idea": "x" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, code);
        assert_eq!(err.error, make().user_message());
    }
}

#[tokio::test]
async fn details_only_in_dev_mode() {
    let reply = "분석을 완료했지만 JSON으로 정리하지 못했습니다.".to_string();

    let client = ScriptedClient::new(Script::Reply(reply.clone()));
    let (status, body) = send(app(client, false), post_json(json!({ "idea": "x" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "malformed_response");
    assert!(err.details.is_none());
    assert!(!String::from_utf8(body).unwrap().contains("details"));

    let client = ScriptedClient::new(Script::Reply(reply));
    let (_, body) = send(app(client, true), post_json(json!({ "idea": "x" }))).await;
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert!(err.details.unwrap().contains("no JSON object boundaries found"));
}

#[tokio::test]
async fn schema_violation_is_reported() {
    let reply = r#"{"summary":"-","evaluation":{"market":{}}}"#.to_string();
    let client = ScriptedClient::new(Script::Reply(reply));
    let (status, body) = send(app(client, true), post_json(json!({ "idea": "x" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "schema_violation");
    assert!(err.details.unwrap().contains("recommendations"));
}

#[tokio::test]
async fn slow_model_times_out_and_call_is_dropped() {
    let client = ScriptedClient::new(Script::Hang);
    let dropped = Arc::clone(&client.dropped);
    let (status, body) = send(app(client, false), post_json(json!({ "idea": "x" }))).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "timeout");
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn healthz_is_ok() {
    let client = ScriptedClient::new(Script::Reply(String::new()));
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = send(app(client, false), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

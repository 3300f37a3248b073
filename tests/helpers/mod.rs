//! Mock scoring service for integration tests
//!
//! Serves the module, report, and chat endpoints on an ephemeral port,
//! records every received request, and exposes switches for injecting
//! failures and response delays.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    fail_result: AtomicBool,
    fail_explanation: AtomicBool,
    fail_report: AtomicBool,
    fail_chat: AtomicBool,
    result_delay_ms: AtomicU64,
    report_delay_ms: AtomicU64,
    top_factors: Mutex<Option<Value>>,
}

/// Mock backend instance bound to an ephemeral port
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn last_request(&self, path: &str) -> Option<RecordedRequest> {
        self.requests().into_iter().rev().find(|r| r.path == path)
    }

    pub fn fail_result(&self) {
        self.state.fail_result.store(true, Ordering::SeqCst);
    }

    pub fn fail_explanation(&self) {
        self.state.fail_explanation.store(true, Ordering::SeqCst);
    }

    pub fn fail_report(&self) {
        self.state.fail_report.store(true, Ordering::SeqCst);
    }

    pub fn fail_chat(&self) {
        self.state.fail_chat.store(true, Ordering::SeqCst);
    }

    pub fn delay_result(&self, ms: u64) {
        self.state.result_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn delay_report(&self, ms: u64) {
        self.state.report_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Override the `top_factors` list the explanation endpoint returns
    pub fn set_top_factors(&self, factors: Value) {
        *self.state.top_factors.lock().unwrap() = Some(factors);
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        body,
    });

    match path.as_str() {
        "/predict/cardiovascular/result" | "/predict/diabetes" | "/predict/idiopathic"
        | "/analyze_cbc" => {
            let delay = state.result_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if state.fail_result.load(Ordering::SeqCst) {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "model unavailable"})),
                )
                    .into_response();
            }
            Json(json!({"risk_probability": 0.42, "risk_category": "Moderate"})).into_response()
        }
        "/predict/cardiovascular/explanation" => {
            if state.fail_explanation.load(Ordering::SeqCst) {
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            let factors = state
                .top_factors
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| json!([{"feature": "ap_hi", "impact": "increases"}]));
            Json(json!({"explanations": {"top_factors": factors}})).into_response()
        }
        "/generate_report" => {
            let delay = state.report_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if state.fail_report.load(Ordering::SeqCst) {
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            Json(json!({"report": "**Medical Analysis Report**\nRisk requires clinical attention."}))
                .into_response()
        }
        "/chat/meditron" => {
            if state.fail_chat.load(Ordering::SeqCst) {
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
            Json(json!({"response": "Please consult a licensed physician."})).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

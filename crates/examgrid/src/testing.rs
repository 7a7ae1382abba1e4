//! In-process stand-in for the scheduling backend, used by the tests.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::client::ApiClient;
use crate::types::{ConfigPayload, ScheduleOutcome, ScheduledExam};

#[derive(Default)]
struct MockState {
    configs: Vec<ConfigPayload>,
    form_titles: Vec<String>,
    fail_config: bool,
    form_rejection: Option<String>,
    outcomes: VecDeque<(ScheduleOutcome, Duration)>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/api/config", get(get_config).post(post_config))
            .route("/api/create_form", post(create_form))
            .route("/api/run_schedule", post(run_schedule))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.url(), Duration::from_secs(5)).unwrap()
    }

    pub fn posted_configs(&self) -> Vec<ConfigPayload> {
        self.state.lock().unwrap().configs.clone()
    }

    pub fn form_titles(&self) -> Vec<String> {
        self.state.lock().unwrap().form_titles.clone()
    }

    pub fn fail_config(&self, fail: bool) {
        self.state.lock().unwrap().fail_config = fail;
    }

    pub fn reject_forms(&self, message: &str) {
        self.state.lock().unwrap().form_rejection = Some(message.to_string());
    }

    /// Queue the answer to the next run request
    pub fn push_outcome(&self, outcome: ScheduleOutcome) {
        self.push_delayed_outcome(outcome, Duration::ZERO);
    }

    /// Queue an answer that is sent only after `delay`
    pub fn push_delayed_outcome(&self, outcome: ScheduleOutcome, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .outcomes
            .push_back((outcome, delay));
    }
}

pub fn outcome(algo: &str, penalty: f64, exams: &[(u32, &str)]) -> ScheduleOutcome {
    ScheduleOutcome {
        algo: algo.to_string(),
        penalty,
        schedule: exams
            .iter()
            .map(|&(day, subject)| ScheduledExam {
                day,
                subject: subject.to_string(),
            })
            .collect(),
    }
}

/// A client pointed at a port nobody listens on
pub async fn unreachable_client() -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(&format!("http://{addr}"), Duration::from_secs(1)).unwrap()
}

async fn get_config() -> Json<serde_json::Value> {
    Json(json!({
        "num_days": 20,
        "holidays": [],
        "allowed_emails": [],
        "form_id": "",
        "subjects": ["Math", "Physics", "Chemistry", "Biology", "History"],
        "last_schedule": null,
        "last_scheduler_output": {},
        "start_date": "2025-01-01"
    }))
}

async fn post_config(State(state): State<Shared>, Json(payload): Json<ConfigPayload>) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_config {
        return (StatusCode::INTERNAL_SERVER_ERROR, "config store down").into_response();
    }
    state.configs.push(payload);
    Json(json!({ "status": "success" })).into_response()
}

async fn create_form(
    State(state): State<Shared>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let title = body["title"].as_str().unwrap_or_default().to_string();
    state.form_titles.push(title);

    if let Some(message) = &state.form_rejection {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": message })),
        )
            .into_response();
    }
    Json(json!({
        "status": "success",
        "url": "https://forms.example/d/form-42/viewform",
        "form_id": "form-42"
    }))
    .into_response()
}

async fn run_schedule(State(state): State<Shared>) -> Response {
    let next = state.lock().unwrap().outcomes.pop_front();
    let Some((outcome, delay)) = next else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "No Form ID provided." })),
        )
            .into_response();
    };

    tokio::time::sleep(delay).await;
    Json(json!({
        "status": "success",
        "algo": outcome.algo,
        "penalty": outcome.penalty,
        "schedule": outcome.schedule,
    }))
    .into_response()
}

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::calendar::{CalendarGrids, HolidaySet};
use crate::html::{self, PageContext};
use crate::session::Session;
use crate::types::FormInputs;
use crate::view::{FormLink, RunStatus, ScheduleSummary};

/// Build the UI router over a session
pub fn router(session: Session) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/inputs", post(inputs_handler))
        .route("/holidays/{index}", post(holiday_handler))
        .route("/form", post(form_handler))
        .route("/run", post(run_handler))
        .route("/api/view", get(view_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

/// Start the UI server
pub async fn serve(port: u16, session: Session) -> anyhow::Result<()> {
    // Push the initial state like a first page load would
    session.render().await;

    let app = router(session);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "Exam scheduler UI running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the main HTML page, showing pending notices once
async fn index_handler(State(session): State<Session>) -> Html<String> {
    let export_url = session.client().export_url();
    let mut view = session.view().await;
    let notices = view.take_notices();
    let markup = html::render_page(
        &view,
        &PageContext {
            export_url: &export_url,
            notices: &notices,
        },
    );
    Html(markup.into_string())
}

async fn inputs_handler(
    State(session): State<Session>,
    Form(inputs): Form<FormInputs>,
) -> Redirect {
    session.update_inputs(inputs).await;
    Redirect::to("/")
}

async fn holiday_handler(State(session): State<Session>, Path(index): Path<u32>) -> Redirect {
    session.toggle_holiday(index).await;
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
struct CreateFormParams {
    title: String,
}

async fn form_handler(
    State(session): State<Session>,
    Form(params): Form<CreateFormParams>,
) -> Redirect {
    session.create_form(&params.title).await;
    Redirect::to("/")
}

/// Start the run and redirect at once so the page shows it as running
async fn run_handler(State(session): State<Session>) -> Redirect {
    // Detached: the outcome shows on the next page load
    let _ = session.start_run().await;
    Redirect::to("/")
}

/// JSON snapshot of the view
#[derive(Debug, Serialize)]
struct ViewSnapshot {
    status: RunStatus,
    summary: Option<ScheduleSummary>,
    form_link: Option<FormLink>,
    holidays: HolidaySet,
    grids: CalendarGrids,
}

async fn view_handler(State(session): State<Session>) -> Json<ViewSnapshot> {
    let view = session.view().await;
    Json(ViewSnapshot {
        status: view.status().clone(),
        summary: view.summary().cloned(),
        form_link: view.form_link().cloned(),
        holidays: view.holidays().clone(),
        grids: view.grids().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SyncPolicy;
    use crate::testing::{outcome, MockBackend};
    use crate::view::CalendarView;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn session(backend: &MockBackend) -> Session {
        Session::new(
            CalendarView::new(FormInputs {
                num_days: "5".to_string(),
                start_date: "2024-01-01".to_string(),
                ..FormInputs::default()
            }),
            backend.client(),
            SyncPolicy {
                attempts: 1,
                backoff: Duration::ZERO,
            },
        )
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post(uri: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_page() {
        let backend = MockBackend::start().await;
        let app = router(session(&backend));

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("Exam Scheduler"));
        assert!(body.contains("Fri 05/01"));
    }

    #[tokio::test]
    async fn test_toggle_holiday_redirects_and_syncs() {
        let backend = MockBackend::start().await;
        let session = session(&backend);
        let app = router(session.clone());

        let response = app.oneshot(post("/holidays/3", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        assert!(session.view().await.holidays().contains(3));
        assert_eq!(backend.posted_configs()[0].holidays, vec![3]);
    }

    #[tokio::test]
    async fn test_update_inputs() {
        let backend = MockBackend::start().await;
        let session = session(&backend);
        let app = router(session.clone());

        let form = "num_days=2&start_date=2024-02-01&subjects=Math%2C+Art\
                    &allowed_emails=&form_id=f9&form_title=Finals";
        let response = app.oneshot(post("/inputs", form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let view = session.view().await;
        assert_eq!(view.grids().input.len(), 2);
        assert_eq!(view.grids().input[0].label, "Thu 01/02");

        let posted = backend.posted_configs();
        assert_eq!(posted[0].subjects, vec!["Math", "Art"]);
        assert_eq!(posted[0].form_id, "f9");
    }

    #[tokio::test]
    async fn test_run_then_view_snapshot() {
        let backend = MockBackend::start().await;
        backend.push_outcome(outcome("Genetic Algorithm", 0.25, &[(0, "Math"), (0, "Physics")]));
        let app = router(session(&backend));

        let response = app.clone().oneshot(post("/run", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        // The run finishes in the background
        let mut snapshot = serde_json::Value::Null;
        for _ in 0..100 {
            let response = app.clone().oneshot(get("/api/view")).await.unwrap();
            snapshot = serde_json::from_str(&body_string(response).await).unwrap();
            if snapshot["status"]["state"] == "done" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(snapshot["status"]["state"], "done");
        assert_eq!(snapshot["summary"]["algo"], "Genetic Algorithm");
        assert_eq!(
            snapshot["grids"]["result"][0]["exam_text"],
            "Math\nPhysics\n"
        );
        assert!(snapshot["grids"]["input"][0]["exam_text"].is_null());
    }

    #[tokio::test]
    async fn test_run_redirects_while_running() {
        let backend = MockBackend::start().await;
        backend.push_delayed_outcome(
            outcome("Genetic Algorithm", 0.25, &[(0, "Math")]),
            Duration::from_millis(300),
        );
        let session = session(&backend);
        let app = router(session.clone());

        let response = app.clone().oneshot(post("/run", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let page = body_string(app.oneshot(get("/")).await.unwrap()).await;
        assert!(page.contains("Running Scheduler..."));
        assert_eq!(session.view().await.status(), &RunStatus::Running);
    }

    #[tokio::test]
    async fn test_form_error_shown_once() {
        let backend = MockBackend::start().await;
        backend.reject_forms("Service account missing");
        let app = router(session(&backend));

        let response = app
            .clone()
            .oneshot(post("/form", "title=Finals"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let first = body_string(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(first.contains("Service account missing"));

        let second = body_string(app.oneshot(get("/")).await.unwrap()).await;
        assert!(!second.contains("Service account missing"));
    }

    #[tokio::test]
    async fn test_bad_holiday_index_rejected() {
        let backend = MockBackend::start().await;
        let app = router(session(&backend));

        let response = app.oneshot(post("/holidays/abc", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

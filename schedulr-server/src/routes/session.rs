//! Session endpoints: upload, reset, view and event detail

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};

use schedulr_core::suggest::PlacementIssue;
use schedulr_core::{
    Action, CalendarEvent, EventDetail, Failure, Planner, SchedulrError, Session, Status, WeekGrid,
};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(show))
        .route("/session/upload", post(upload))
        .route("/session/reset", post(reset))
        .route("/session/events/{id}", get(event_detail))
        .route("/session/events/{id}/select", post(select))
        .route("/session/detail/close", post(close_detail))
}

#[derive(Serialize)]
pub struct WeekView {
    pub start: String,
    pub end: String,
}

/// Everything a client needs to draw the current state
#[derive(Serialize)]
pub struct SessionView {
    pub status: Status,
    pub error: Option<String>,
    pub week: Option<WeekView>,
    pub events: Vec<CalendarEvent>,
    pub grid: Option<WeekGrid>,
    pub selected: Option<EventDetail>,
    pub issues: Vec<PlacementIssue>,
}

impl SessionView {
    fn new(session: &Session, planner: &Planner) -> Self {
        SessionView {
            status: session.status(),
            error: session.error().map(str::to_string),
            week: session.week().map(|w| WeekView {
                start: w.start_date().to_string(),
                end: w.end_date().to_string(),
            }),
            events: session.visible_events().cloned().collect(),
            grid: session.grid(),
            selected: session.selected_event().map(EventDetail::from),
            issues: planner.audit(session),
        }
    }
}

/// GET /session
async fn show(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(SessionView::new(&session, &state.planner))
}

/// POST /session/upload - Body is the raw calendar text
///
/// The work runs in its own task, so a client that disconnects does not
/// leave the session stuck in `parsing` or `generating`.
async fn upload(State(state): State<AppState>, body: String) -> Result<Json<SessionView>, AppError> {
    let attempt = {
        let mut session = state.session.lock().await;
        session.apply(Action::Upload)?;
        session.attempt()
    };
    info!("Processing uploaded calendar ({} bytes)", body.len());

    let pipeline = tokio::spawn(process_upload(state.clone(), body, attempt));
    let outcome = pipeline.await;

    let mut session = state.session.lock().await;
    if let Err(e) = outcome {
        error!("Upload pipeline aborted: {}", e);
        fail_attempt(&mut session, attempt, &e.to_string());
    }
    Ok(Json(SessionView::new(&session, &state.planner)))
}

/// Parse then generate, applying each outcome to the session.
///
/// The lock is released while parsing and while waiting for the AI, so
/// `GET /session` keeps answering. Results for an upload that was reset in
/// the meantime are dropped.
async fn process_upload(state: AppState, body: String, attempt: u64) {
    let planner = state.planner.clone();
    let parsed = match tokio::task::spawn_blocking(move || planner.parse_step(&body)).await {
        Ok(action) => action,
        Err(e) => Action::Failed(Failure::Parse(e.to_string())),
    };

    let classes = {
        let mut session = state.session.lock().await;
        if session.attempt() != attempt {
            return;
        }
        apply_outcome(&mut session, parsed);
        if session.status() != Status::Generating {
            return;
        }
        session.classes().to_vec()
    };

    let outcome = state.planner.generate_step(&classes).await;

    let mut session = state.session.lock().await;
    if session.attempt() == attempt {
        apply_outcome(&mut session, outcome);
    }
}

fn apply_outcome(session: &mut Session, action: Action) {
    if let Err(e) = session.apply(action) {
        warn!("Dropping upload result: {}", e);
    }
}

/// Move a still-running attempt to `error`.
fn fail_attempt(session: &mut Session, attempt: u64, detail: &str) {
    if session.attempt() != attempt {
        return;
    }
    let failure = match session.status() {
        Status::Parsing => Failure::Parse(detail.to_string()),
        Status::Generating => Failure::Generation(detail.to_string()),
        _ => return,
    };
    apply_outcome(session, Action::Failed(failure));
}

/// POST /session/reset
async fn reset(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.apply(Action::Reset)?;
    Ok(Json(SessionView::new(&session, &state.planner)))
}

/// GET /session/events/{id} - Detail card of a visible event
async fn event_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, AppError> {
    let session = state.session.lock().await;
    let event = session
        .find_event(&id)
        .ok_or(SchedulrError::EventNotFound(id.clone()))?;
    Ok(Json(EventDetail::from(event)))
}

/// POST /session/events/{id}/select - Open the detail card
async fn select(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.apply(Action::Select(id))?;
    Ok(Json(SessionView::new(&session, &state.planner)))
}

/// POST /session/detail/close
async fn close_detail(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.apply(Action::CloseDetail)?;
    Ok(Json(SessionView::new(&session, &state.planner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use schedulr_core::suggest::{GenerationRequest, TextGenerator};
    use schedulr_core::{GenerationError, IngestOptions};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FakeGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    const MATH_ICS: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n\
BEGIN:VEVENT\r\nUID:math\r\nSUMMARY:Math101\r\n\
DTSTART:20250901T090000\r\nDTEND:20250901T100000\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n";

    const REVIEW: &str = r#"{"study_suggestions":[{"title":"Review for Math101",
        "day_of_week":"Monday","start_time":"11:00","end_time":"12:30",
        "description":"Consolidate the lecture"}]}"#;

    /// Answers after a delay, or panics when given no reply
    struct SlowGenerator {
        delay: Duration,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(self.delay).await;
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => panic!("generator crashed"),
            }
        }
    }

    fn app_with(generator: Arc<dyn TextGenerator>) -> Router {
        let options = IngestOptions {
            now: Some(Utc.with_ymd_and_hms(2025, 8, 25, 0, 0, 0).unwrap()),
            ..IngestOptions::default()
        };
        let planner = Planner::new(Some(generator), options);
        crate::app(AppState::with_planner(planner))
    }

    fn app(reply: &'static str) -> Router {
        app_with(Arc::new(FakeGenerator(reply)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upload_displays_classes_and_suggestions() {
        let app = app(REVIEW);

        let (status, body) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "displaying");
        assert_eq!(body["events"].as_array().unwrap().len(), 2);
        assert_eq!(body["events"][1]["kind"], "study_suggestion");
        assert_eq!(body["week"]["start"], "2025-08-31");
        assert_eq!(body["grid"]["placements"][0]["row_start"], 4);

        let id = body["events"][1]["id"].as_str().unwrap().to_string();
        let (status, detail) = send(&app, "GET", &format!("/session/events/{}", id), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["heading"], "AI Study Suggestion");
        assert_eq!(detail["reason"], "Consolidate the lecture");

        let (status, body) = send(&app, "POST", &format!("/session/events/{}/select", id), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"]["title"], "Review for Math101");

        let (_, body) = send(&app, "POST", "/session/detail/close", "").await;
        assert!(body["selected"].is_null());
    }

    #[tokio::test]
    async fn test_second_upload_conflicts_until_reset() {
        let app = app(REVIEW);
        send(&app, "POST", "/session/upload", MATH_ICS).await;

        let (status, body) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("upload"));

        let (status, body) = send(&app, "POST", "/session/reset", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "initial");
        assert!(body["grid"].is_null());

        let (status, _) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failures_end_in_error_state() {
        let app = app("{}");

        let (status, body) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().starts_with("Failed to generate study suggestions."));
        assert_eq!(body["events"].as_array().unwrap().len(), 0);

        let (_, body) = send(&app, "POST", "/session/upload", "not a calendar").await;
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().starts_with("Failed to process calendar."));
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let app = app(REVIEW);
        send(&app, "POST", "/session/upload", MATH_ICS).await;

        let (status, body) = send(&app, "GET", "/session/events/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Event not found: nope");
    }

    #[tokio::test]
    async fn test_dropped_upload_still_finishes() {
        let app = app_with(Arc::new(SlowGenerator {
            delay: Duration::from_millis(200),
            reply: Some(REVIEW),
        }));

        let dropped = tokio::time::timeout(
            Duration::from_millis(50),
            send(&app, "POST", "/session/upload", MATH_ICS),
        )
        .await;
        assert!(dropped.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let (_, body) = send(&app, "GET", "/session", "").await;
        assert_eq!(body["status"], "displaying");
        assert_eq!(body["events"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_crashed_generation_ends_in_error_state() {
        let app = app_with(Arc::new(SlowGenerator {
            delay: Duration::ZERO,
            reply: None,
        }));

        let (status, body) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().starts_with("Failed to generate study suggestions."));

        let (status, _) = send(&app, "POST", "/session/upload", MATH_ICS).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_fail_attempt_ignores_stale_attempts() {
        let mut session = Session::new();
        session.apply(Action::Upload).unwrap();
        let attempt = session.attempt();

        fail_attempt(&mut session, attempt + 1, "gone");
        assert_eq!(session.status(), Status::Parsing);

        fail_attempt(&mut session, attempt, "worker stopped");
        assert_eq!(session.status(), Status::Error);
        assert!(session.error().unwrap().starts_with("Failed to process calendar. worker stopped."));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(REVIEW), "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}

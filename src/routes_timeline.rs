// --------------------------------------------------
// HTTP handlers for the day timeline.
//
// Responsibilities:
// - Refresh: read the repository file, build a snapshot, seed the overlay
// - Serve the current overlay view (items, overflow, summary, warnings)
// - Apply move / resize / revert intents to the overlay
// --------------------------------------------------

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use timeline_scheduler::backdrop::{self, Backdrop, FieldError};
use timeline_scheduler::config::ServerConfig;
use timeline_scheduler::merge::{self, OverlapViolation};
use timeline_scheduler::models::{ItemKind, PlanNarrative, SourceRef, TimelineItem};
use timeline_scheduler::overlay::ItemEdit;
use timeline_scheduler::priority;
use timeline_scheduler::summary::{self, Summary};
use timeline_scheduler::{EngineConfig, SyncState, TimelineError, TimelineSnapshot, time};

use crate::session::{Session, TimelineSession};
use crate::store;

pub struct AppState {
    pub config: ServerConfig,
    pub session: Mutex<Session>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            session: Mutex::new(Session::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub date: String, // "YYYY-MM-DD"
}

#[derive(Debug, Deserialize)]
pub struct EditInput {
    pub start: String, // RFC3339
    pub end: String,   // RFC3339
}

#[derive(Debug, Serialize)]
pub struct TimelineView {
    pub date: String,
    pub state: SyncState,
    pub items: Vec<ItemView>,
    pub overflow: Vec<OverflowView>,
    pub summary: Summary,
    pub violations: Vec<OverlapViolation>,
    pub backdrops: Vec<Backdrop>,
    pub working_hour_errors: Vec<FieldError>,
    pub constraint_errors: Vec<FieldError>,
    pub dropped: usize,
    pub pending_edits: Vec<ItemEdit>,
    pub narrative: Option<PlanNarrative>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub kind: ItemKind,
    pub kind_label: &'static str,
    pub editable: bool,
    pub start: String,
    pub end: String,
    pub time_label: String, // "09:00 - 10:30"
    pub start_minute: u32,  // minutes since local midnight
    pub end_minute: u32,
    pub duration_min: i64,
    pub duration_label: String,
    pub source_ref: Option<SourceRef>,
}

#[derive(Debug, Serialize)]
pub struct OverflowView {
    pub task_id: String,
    pub title: String,
    pub priority: i64,
    pub priority_label: &'static str,
    pub priority_class: &'static str,
    pub minutes: i64,
    pub splittable: bool,
    pub due_at: Option<String>,
}

fn item_view(item: &TimelineItem, cfg: &EngineConfig) -> ItemView {
    let tz = cfg.timezone;
    ItemView {
        id: item.id.clone(),
        title: item.display_title().to_string(),
        kind: item.kind,
        kind_label: item.kind.label(),
        editable: item.editable,
        start: item.start.to_rfc3339(),
        end: item.end.to_rfc3339(),
        time_label: format!(
            "{} - {}",
            time::format_clock(&item.start, tz),
            time::format_clock(&item.end, tz)
        ),
        start_minute: time::minutes_of_day(&item.start, tz),
        end_minute: time::minutes_of_day(&item.end, tz),
        duration_min: item.duration_min(),
        duration_label: time::format_duration(item.duration_min()),
        source_ref: item.source_ref,
    }
}

fn build_view(session: &TimelineSession) -> TimelineView {
    let cfg = &session.engine;
    let overlay = &session.overlay;
    let baseline = overlay.baseline();
    let items = overlay.items();

    let overflow = summary::compute_overflow(&session.tasks, items);
    let summary = summary::compute_summary(items, &overflow, cfg);

    let overflow = overflow
        .into_iter()
        .map(|t| {
            let label = priority::classify(t.priority);
            OverflowView {
                task_id: t.id.to_string(),
                minutes: t.effective_minutes(),
                splittable: t.is_splittable(),
                due_at: t.due_at.map(|d| d.to_rfc3339()),
                title: t.title,
                priority: t.priority,
                priority_label: label.as_str(),
                priority_class: label.class(),
            }
        })
        .collect();

    TimelineView {
        date: baseline.date.to_string(),
        state: overlay.state(),
        items: items.iter().map(|i| item_view(i, cfg)).collect(),
        overflow,
        summary,
        violations: merge::validate_non_overlap(items),
        backdrops: backdrop::backdrops(baseline.date, &baseline.working_hours, cfg.timezone),
        working_hour_errors: backdrop::validate_working_hours(&baseline.working_hours)
            .err()
            .unwrap_or_default(),
        constraint_errors: backdrop::validate_constraints(&session.constraints)
            .err()
            .unwrap_or_default(),
        dropped: baseline.dropped,
        pending_edits: overlay.pending_edits(),
        narrative: session.narrative.clone(),
    }
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

fn timeline_error_response(err: TimelineError) -> Response {
    let status = match err {
        TimelineError::NotEditable { .. } => StatusCode::CONFLICT,
        TimelineError::UnknownItem { .. } => StatusCode::NOT_FOUND,
        TimelineError::InvalidTimestamp { .. }
        | TimelineError::InvalidTimeOfDay { .. }
        | TimelineError::InvalidDuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.code(), err.to_string())
}

fn no_timeline() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "no_timeline",
        "no timeline loaded; refresh first".to_string(),
    )
}

// -----------------------------
// GET /api/timeline?date=YYYY-MM-DD
// Refreshes from the repository file and seeds the overlay
// -----------------------------
pub async fn refresh_timeline(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TimelineQuery>,
) -> Response {
    let date = match NaiveDate::parse_from_str(&q.date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_date", "invalid date".to_string());
        }
    };

    let ticket = state.session.lock().await.gate.begin();

    let db = match store::load_db(&state.config.db_path) {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to load repository file");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "load_failed",
                "failed to load db".to_string(),
            );
        }
    };

    let engine = EngineConfig::from_settings(&db.settings, state.config.timezone_override.as_deref());
    let sources = store::day_sources(&db, date, engine.timezone);
    let snapshot = TimelineSnapshot::build(date, sources.as_sources(), &db.settings.working_hours, &engine);
    info!(%date, ticket, items = snapshot.items.len(), "timeline refreshed");

    let mut session = state.session.lock().await;
    session.apply_refresh(
        ticket,
        snapshot,
        sources.tasks,
        sources.narrative,
        sources.constraints,
        engine,
    );

    match &session.current {
        Some(current) => Json(build_view(current)).into_response(),
        None => no_timeline(),
    }
}

// -----------------------------
// GET /api/timeline/current
// Returns the overlay view without refreshing
// -----------------------------
pub async fn current_timeline(State(state): State<Arc<AppState>>) -> Response {
    let session = state.session.lock().await;
    match &session.current {
        Some(current) => Json(build_view(current)).into_response(),
        None => no_timeline(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Edit {
    Move,
    Resize,
}

async fn edit_item(state: Arc<AppState>, id: String, input: EditInput, edit: Edit) -> Response {
    let mut session = state.session.lock().await;
    let Some(current) = session.current.as_mut() else {
        return no_timeline();
    };

    let tz = current.engine.timezone;
    let span = time::parse_timestamp(&input.start, tz)
        .and_then(|start| Ok((start, time::parse_timestamp(&input.end, tz)?)));
    let (start, end) = match span {
        Ok(span) => span,
        Err(err) => return timeline_error_response(err),
    };

    let result = match edit {
        Edit::Move => current.overlay.apply_move(&id, start, end),
        Edit::Resize => current.overlay.apply_resize(&id, start, end),
    };
    match result {
        Ok(()) => Json(build_view(current)).into_response(),
        Err(err) => timeline_error_response(err),
    }
}

// -----------------------------
// POST /api/timeline/items/:id/move
// -----------------------------
pub async fn move_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<EditInput>,
) -> Response {
    edit_item(state, id, input, Edit::Move).await
}

// -----------------------------
// POST /api/timeline/items/:id/resize
// -----------------------------
pub async fn resize_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<EditInput>,
) -> Response {
    edit_item(state, id, input, Edit::Resize).await
}

// -----------------------------
// POST /api/timeline/revert
// Drops local edits
// -----------------------------
pub async fn revert_timeline(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.lock().await;
    let Some(current) = session.current.as_mut() else {
        return no_timeline();
    };
    current.overlay.revert();
    Json(build_view(current)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use timeline_scheduler::models::{BlockKind, Db, FixedEvent, GeneratedPlan, PlanBlock, Task, TaskStatus};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
        work_id: Uuid,
        event_id: Uuid,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db.json");

        let task = Task {
            id: Uuid::new_v4(),
            title: "Write report".to_string(),
            status: TaskStatus::Open,
            priority: 5,
            estimate_minutes: 90,
            due_at: None,
            fixed: None,
        };
        let work_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();

        let mut db = Db::default();
        db.plans.push(GeneratedPlan {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            blocks: vec![PlanBlock {
                id: work_id,
                start_at: "2026-01-12T09:00:00+09:00".to_string(),
                end_at: "2026-01-12T10:30:00+09:00".to_string(),
                kind: BlockKind::Work,
                task_id: Some(task.id),
                task_title: None,
            }],
            narrative: None,
        });
        db.tasks.push(task);
        db.events.push(FixedEvent {
            id: event_id,
            title: "Standup".to_string(),
            start_at: "2026-01-12T11:00:00+09:00".to_string(),
            end_at: "2026-01-12T11:30:00+09:00".to_string(),
            locked: true,
        });
        store::save_db(&db_path, &db).unwrap();

        let config = ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            db_path,
            timezone_override: None,
        };
        Fixture {
            _dir: dir,
            state: Arc::new(AppState::new(config)),
            work_id,
            event_id,
        }
    }

    async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = crate::app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn current_before_refresh_is_not_found() {
        let f = fixture();
        let (status, body) = call(&f.state, get("/api/timeline/current")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "no_timeline");
    }

    #[tokio::test]
    async fn refresh_returns_ordered_view() {
        let f = fixture();
        let (status, body) = call(&f.state, get("/api/timeline?date=2026-01-12")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "synced");
        assert_eq!(body["items"][0]["title"], "Write report");
        assert_eq!(body["items"][0]["duration_label"], "1h30m");
        assert_eq!(body["items"][1]["kind"], "fixed");
        assert_eq!(body["summary"]["work_minutes"], 90);
        assert_eq!(body["summary"]["attention_points"][0]["kind"], "rest");
        assert_eq!(body["backdrops"].as_array().unwrap().len(), 2);
        assert!(body["working_hour_errors"].as_array().unwrap().is_empty());
        assert!(body["constraint_errors"].as_array().unwrap().is_empty());
        assert_eq!(body["items"][0]["start_minute"], 540);
        assert!(body["overflow"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_reports_out_of_range_constraints() {
        let f = fixture();
        let mut db = store::load_db(&f.state.config.db_path).unwrap();
        db.settings.constraints.focus_max_minutes = 240;
        store::save_db(&f.state.config.db_path, &db).unwrap();

        let (status, body) = call(&f.state, get("/api/timeline?date=2026-01-12")).await;
        assert_eq!(status, StatusCode::OK);
        let errors = body["constraint_errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["field"], "constraints.focus_max_minutes");
        // the timeline itself is still served
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn refresh_rejects_bad_date() {
        let f = fixture();
        let (status, _) = call(&f.state, get("/api/timeline?date=12-01-2026")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn edits_map_to_status_codes() {
        let f = fixture();
        call(&f.state, get("/api/timeline?date=2026-01-12")).await;

        let span = serde_json::json!({
            "start": "2026-01-12T13:00:00+09:00",
            "end": "2026-01-12T14:00:00+09:00",
        });

        let uri = format!("/api/timeline/items/{}/move", f.event_id);
        let (status, body) = call(&f.state, post_json(&uri, span.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "not_editable");

        let uri = format!("/api/timeline/items/{}/resize", f.work_id);
        let bad = serde_json::json!({ "start": "2026-01-12T13:00:00+09:00", "end": "2026-01-12T13:00:00+09:00" });
        let (status, _) = call(&f.state, post_json(&uri, bad)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let garbled = serde_json::json!({ "start": "tomorrow-ish", "end": "2026-01-12T14:00:00+09:00" });
        let (status, body) = call(&f.state, post_json(&uri, garbled)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "invalid_timestamp");

        let (status, _) = call(&f.state, post_json("/api/timeline/items/nope/move", span.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/timeline/items/{}/move", f.work_id);
        let (status, body) = call(&f.state, post_json(&uri, span)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "dirty");
        assert_eq!(body["items"][0]["kind"], "fixed");
        assert_eq!(body["pending_edits"].as_array().unwrap().len(), 1);

        let (status, body) = call(&f.state, post_json("/api/timeline/revert", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "synced");
    }

    #[tokio::test]
    async fn refresh_discards_local_edits() {
        let f = fixture();
        call(&f.state, get("/api/timeline?date=2026-01-12")).await;

        let uri = format!("/api/timeline/items/{}/move", f.work_id);
        let span = serde_json::json!({
            "start": "2026-01-12T13:00:00+09:00",
            "end": "2026-01-12T14:00:00+09:00",
        });
        let (_, body) = call(&f.state, post_json(&uri, span)).await;
        assert_eq!(body["state"], "dirty");

        let (_, body) = call(&f.state, get("/api/timeline?date=2026-01-12")).await;
        assert_eq!(body["state"], "synced");
        assert_eq!(body["items"][0]["start"], "2026-01-12T09:00:00+09:00");
    }
}

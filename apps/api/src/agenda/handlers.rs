use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agenda::{NewEvent, NewTask, TaskPatch};
use crate::errors::AppError;
use crate::models::agenda::{CalendarEvent, Task};
use crate::state::AppState;
use crate::stats::aggregator::{event_stats, task_stats, EventStats, TaskStats};
use crate::stats::calendar::{TaskBucket, ViewerClock};

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub bucket: TaskBucket,
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ClockQuery {
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<CalendarEvent>,
    pub stats: EventStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Tasks
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tasks?bucket=overdue&tz_offset_minutes=-180
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListQuery>,
) -> Json<TaskListResponse> {
    let clock = ViewerClock::for_offset(params.tz_offset_minutes);
    let tasks = state.tasks.list(params.bucket, &clock).await;
    let stats = task_stats(&state.tasks.all().await, &clock);
    Json(TaskListResponse { tasks, stats })
}

/// POST /api/v1/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Json(request): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.tasks.create(request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PATCH /api/v1/tasks/:id
pub async fn handle_update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.tasks.update(id, patch).await?))
}

/// POST /api/v1/tasks/:id/complete
pub async fn handle_complete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.tasks.complete(id).await?))
}

/// DELETE /api/v1/tasks/:id?confirm=true
pub async fn handle_delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete(id, params.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Calendar
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/events
pub async fn handle_list_events(
    State(state): State<AppState>,
    Query(params): Query<ClockQuery>,
) -> Json<EventListResponse> {
    let clock = ViewerClock::for_offset(params.tz_offset_minutes);
    let events = state.events.list().await;
    let stats = event_stats(&events, &clock);
    Json(EventListResponse { events, stats })
}

/// POST /api/v1/events
pub async fn handle_create_event(
    State(state): State<AppState>,
    Json(request): Json<NewEvent>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    let event = state.events.create(request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// DELETE /api/v1/events/:id?confirm=true
pub async fn handle_delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    state.events.delete(id, params.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::execution::simulator::RunTarget;
use crate::models::execution::FollowUpExecution;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecutionQuery {
    pub flow_id: Option<Uuid>,
}

/// POST /api/v1/flows/:id/run
///
/// Starts a simulated run and returns the initial `running` record.
/// Progress is observed through GET /api/v1/executions/:id.
pub async fn handle_run_flow(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
    Json(target): Json<RunTarget>,
) -> Result<(StatusCode, Json<FollowUpExecution>), AppError> {
    let launched = state.simulator.start(flow_id, target).await?;
    Ok((StatusCode::ACCEPTED, Json(launched.execution)))
}

/// GET /api/v1/executions
pub async fn handle_list_executions(
    State(state): State<AppState>,
    Query(params): Query<ExecutionQuery>,
) -> Json<Vec<FollowUpExecution>> {
    Json(state.executions.list(params.flow_id).await)
}

/// GET /api/v1/executions/:id
pub async fn handle_get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowUpExecution>, AppError> {
    Ok(Json(state.executions.get(id).await?))
}

/// POST /api/v1/executions/:id/cancel
pub async fn handle_cancel_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowUpExecution>, AppError> {
    Ok(Json(state.simulator.cancel(id).await?))
}

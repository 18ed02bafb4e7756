use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::download::JsonDownload;
use crate::errors::AppError;
use crate::flows::transfer::parse_import;
use crate::flows::{FlowPatch, NewFlow};
use crate::models::flow::FollowUpFlow;
use crate::state::AppState;
use crate::stats::aggregator::{flow_stats, FlowStats};

#[derive(Debug, Serialize)]
pub struct FlowListResponse {
    pub flows: Vec<FollowUpFlow>,
    pub stats: FlowStats,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: Vec<FollowUpFlow>,
}

/// GET /api/v1/flows
pub async fn handle_list_flows(State(state): State<AppState>) -> Json<FlowListResponse> {
    let flows = state.flows.list().await;
    let stats = flow_stats(&flows);
    Json(FlowListResponse { flows, stats })
}

/// POST /api/v1/flows
pub async fn handle_create_flow(
    State(state): State<AppState>,
    Json(request): Json<NewFlow>,
) -> Result<(StatusCode, Json<FollowUpFlow>), AppError> {
    let flow = state.flows.create(request).await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

/// GET /api/v1/flows/:id
pub async fn handle_get_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowUpFlow>, AppError> {
    Ok(Json(state.flows.get(id).await?))
}

/// PATCH /api/v1/flows/:id
pub async fn handle_update_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FlowPatch>,
) -> Result<Json<FollowUpFlow>, AppError> {
    Ok(Json(state.flows.update(id, patch).await?))
}

/// DELETE /api/v1/flows/:id?confirm=true
pub async fn handle_delete_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    state.flows.delete(id, params.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/flows/:id/activate
pub async fn handle_activate_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowUpFlow>, AppError> {
    Ok(Json(state.flows.activate(id).await?))
}

/// POST /api/v1/flows/:id/pause
pub async fn handle_pause_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowUpFlow>, AppError> {
    Ok(Json(state.flows.pause(id).await?))
}

/// POST /api/v1/flows/:id/duplicate
pub async fn handle_duplicate_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<FollowUpFlow>), AppError> {
    let copy = state.flows.duplicate(id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// GET /api/v1/flows/export
pub async fn handle_export_flows(State(state): State<AppState>) -> Result<JsonDownload, AppError> {
    let flows = state.flows.list().await;
    JsonDownload::new("flows", Utc::now().date_naive(), &flows)
}

/// GET /api/v1/flows/:id/export
///
/// Single-flow export is still a one-element list so it re-imports as-is.
pub async fn handle_export_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<JsonDownload, AppError> {
    let flow = state.flows.get(id).await?;
    JsonDownload::new(&flow.name, Utc::now().date_naive(), std::slice::from_ref(&flow))
}

/// POST /api/v1/flows/import
///
/// Body is the raw JSON file. Nothing is stored unless the whole document
/// parses and validates.
pub async fn handle_import_flows(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let incoming = parse_import(&body)?;
    let imported = state.flows.append_all(incoming).await;
    Ok((StatusCode::CREATED, Json(ImportResponse { imported })))
}

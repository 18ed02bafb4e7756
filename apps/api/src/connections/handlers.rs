use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connections::registry::IntegrationView;
use crate::connections::schema::{fields_for, FieldSpec};
use crate::errors::AppError;
use crate::models::connection::IntegrationKind;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntegrationRequest {
    pub kind: IntegrationKind,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub kind: IntegrationKind,
    pub fields: &'static [FieldSpec],
}

/// GET /api/v1/connections/schema/:kind
pub async fn handle_get_schema(
    Path(kind): Path<IntegrationKind>,
) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        kind,
        fields: fields_for(kind),
    })
}

/// GET /api/v1/connections
pub async fn handle_list_connections(State(state): State<AppState>) -> Json<Vec<IntegrationView>> {
    Json(state.connections.list().await)
}

/// POST /api/v1/connections
pub async fn handle_create_connection(
    State(state): State<AppState>,
    Json(request): Json<CreateIntegrationRequest>,
) -> Result<(StatusCode, Json<IntegrationView>), AppError> {
    let view = state.connections.create(request.kind, &request.name).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/connections/:id
pub async fn handle_get_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntegrationView>, AppError> {
    Ok(Json(state.connections.get(id).await?))
}

/// PUT /api/v1/connections/:id/config
///
/// Rejected with per-field errors unless every required field is filled.
pub async fn handle_configure_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<IntegrationView>, AppError> {
    Ok(Json(state.connections.configure(id, &request.values).await?))
}

/// POST /api/v1/connections/:id/test
pub async fn handle_test_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntegrationView>, AppError> {
    Ok(Json(state.connections.test(id).await?))
}

/// POST /api/v1/connections/:id/disable
pub async fn handle_disable_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntegrationView>, AppError> {
    Ok(Json(state.connections.disable(id).await?))
}

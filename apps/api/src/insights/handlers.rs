use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::insights::NewInsight;
use crate::models::insight::AiInsight;
use crate::state::AppState;

/// GET /api/v1/insights
pub async fn handle_list_insights(State(state): State<AppState>) -> Json<Vec<AiInsight>> {
    Json(state.insights.list().await)
}

/// POST /api/v1/insights
pub async fn handle_create_insight(
    State(state): State<AppState>,
    Json(request): Json<NewInsight>,
) -> Result<(StatusCode, Json<AiInsight>), AppError> {
    let insight = state.insights.create(request).await?;
    Ok((StatusCode::CREATED, Json(insight)))
}

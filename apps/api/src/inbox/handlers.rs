use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inbox::ConversationFilter;
use crate::models::conversation::Conversation;
use crate::state::AppState;
use crate::stats::aggregator::{conversation_stats, ConversationStats};

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
    /// Computed over the whole inbox, not just the filtered page.
    pub stats: ConversationStats,
}

/// GET /api/v1/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    Query(filter): Query<ConversationFilter>,
) -> Json<ConversationListResponse> {
    let conversations = state.inbox.list(&filter).await;
    let stats = conversation_stats(&state.inbox.all().await);
    Json(ConversationListResponse {
        conversations,
        stats,
    })
}

/// POST /api/v1/conversations/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Conversation>, AppError> {
    Ok(Json(state.inbox.mark_read(id).await?))
}

/// POST /api/v1/conversations/:id/pin
pub async fn handle_toggle_pin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Conversation>, AppError> {
    Ok(Json(state.inbox.toggle_pin(id).await?))
}

use axum::{extract::State, Json};
use serde::Serialize;

use crate::fleet::RefreshOutcome;
use crate::models::server::Server;
use crate::state::AppState;
use crate::stats::aggregator::{fleet_stats, FleetStats};

#[derive(Debug, Serialize)]
pub struct FleetResponse {
    pub servers: Vec<Server>,
    pub stats: FleetStats,
}

/// GET /api/v1/servers
pub async fn handle_list_servers(State(state): State<AppState>) -> Json<FleetResponse> {
    let servers = state.fleet.list().await;
    let stats = fleet_stats(&servers);
    Json(FleetResponse { servers, stats })
}

/// POST /api/v1/servers/refresh
///
/// Returns `{"outcome": "skipped"}` when a refresh is already running.
pub async fn handle_refresh_servers(State(state): State<AppState>) -> Json<RefreshOutcome> {
    Json(state.fleet.refresh().await)
}

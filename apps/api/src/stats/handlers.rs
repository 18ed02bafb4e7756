use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::logs::LogFilter;
use crate::state::AppState;
use crate::stats::aggregator::{
    conversation_stats, event_stats, execution_stats, fleet_stats, flow_stats, log_stats,
    task_stats, ConversationStats, EventStats, ExecutionStats, FleetStats, FlowStats, LogStats,
    TaskStats,
};
use crate::stats::calendar::ViewerClock;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tz_offset_minutes: Option<i32>,
}

/// Every panel's headline numbers, recomputed on each request.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub flows: FlowStats,
    pub executions: ExecutionStats,
    pub tasks: TaskStats,
    pub events: EventStats,
    pub conversations: ConversationStats,
    pub logs: LogStats,
    pub servers: FleetStats,
    pub insights: usize,
}

/// GET /api/v1/stats
pub async fn handle_dashboard_stats(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Json<DashboardStats> {
    let clock = ViewerClock::for_offset(params.tz_offset_minutes);
    let logs = state.log.query(&LogFilter::default()).await;

    Json(DashboardStats {
        flows: flow_stats(&state.flows.list().await),
        executions: execution_stats(&state.executions.list(None).await),
        tasks: task_stats(&state.tasks.all().await, &clock),
        events: event_stats(&state.events.list().await, &clock),
        conversations: conversation_stats(&state.inbox.all().await),
        logs: log_stats(&logs),
        servers: fleet_stats(&state.fleet.list().await),
        insights: state.insights.list().await.len(),
    })
}

pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::{agenda, connections, execution, fleet, flows, inbox, insights, logs, stats};

/// Actions that would reach real people or systems stay disabled.
async fn demo_only() -> Result<(), AppError> {
    Err(AppError::DemoMode(
        "This action is disabled in the demo environment".to_string(),
    ))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/stats", get(stats::handlers::handle_dashboard_stats))
        // Flows
        .route(
            "/api/v1/flows",
            get(flows::handlers::handle_list_flows).post(flows::handlers::handle_create_flow),
        )
        .route("/api/v1/flows/export", get(flows::handlers::handle_export_flows))
        .route("/api/v1/flows/import", post(flows::handlers::handle_import_flows))
        .route(
            "/api/v1/flows/:id",
            get(flows::handlers::handle_get_flow)
                .patch(flows::handlers::handle_update_flow)
                .delete(flows::handlers::handle_delete_flow),
        )
        .route("/api/v1/flows/:id/activate", post(flows::handlers::handle_activate_flow))
        .route("/api/v1/flows/:id/pause", post(flows::handlers::handle_pause_flow))
        .route("/api/v1/flows/:id/duplicate", post(flows::handlers::handle_duplicate_flow))
        .route("/api/v1/flows/:id/export", get(flows::handlers::handle_export_flow))
        // Executions
        .route("/api/v1/flows/:id/run", post(execution::handlers::handle_run_flow))
        .route("/api/v1/executions", get(execution::handlers::handle_list_executions))
        .route("/api/v1/executions/:id", get(execution::handlers::handle_get_execution))
        .route(
            "/api/v1/executions/:id/cancel",
            post(execution::handlers::handle_cancel_execution),
        )
        // Connections
        .route(
            "/api/v1/connections",
            get(connections::handlers::handle_list_connections)
                .post(connections::handlers::handle_create_connection),
        )
        .route(
            "/api/v1/connections/schema/:kind",
            get(connections::handlers::handle_get_schema),
        )
        .route("/api/v1/connections/:id", get(connections::handlers::handle_get_connection))
        .route(
            "/api/v1/connections/:id/config",
            put(connections::handlers::handle_configure_connection),
        )
        .route(
            "/api/v1/connections/:id/test",
            post(connections::handlers::handle_test_connection),
        )
        .route(
            "/api/v1/connections/:id/disable",
            post(connections::handlers::handle_disable_connection),
        )
        .route("/api/v1/connections/:id/send", post(demo_only))
        // Inbox
        .route("/api/v1/conversations", get(inbox::handlers::handle_list_conversations))
        .route("/api/v1/conversations/:id/read", post(inbox::handlers::handle_mark_read))
        .route("/api/v1/conversations/:id/pin", post(inbox::handlers::handle_toggle_pin))
        // Agenda
        .route(
            "/api/v1/tasks",
            get(agenda::handlers::handle_list_tasks).post(agenda::handlers::handle_create_task),
        )
        .route(
            "/api/v1/tasks/:id",
            patch(agenda::handlers::handle_update_task).delete(agenda::handlers::handle_delete_task),
        )
        .route("/api/v1/tasks/:id/complete", post(agenda::handlers::handle_complete_task))
        .route(
            "/api/v1/events",
            get(agenda::handlers::handle_list_events).post(agenda::handlers::handle_create_event),
        )
        .route("/api/v1/events/:id", delete(agenda::handlers::handle_delete_event))
        // Insights, logs, fleet
        .route(
            "/api/v1/insights",
            get(insights::handlers::handle_list_insights)
                .post(insights::handlers::handle_create_insight),
        )
        .route("/api/v1/logs", get(logs::handlers::handle_list_logs))
        .route("/api/v1/logs/export", get(logs::handlers::handle_export_logs))
        .route("/api/v1/servers", get(fleet::handlers::handle_list_servers))
        .route("/api/v1/servers/refresh", post(fleet::handlers::handle_refresh_servers))
        // Team
        .route("/api/v1/team/invites", post(demo_only))
        .with_state(state)
}

mod agenda;
mod config;
mod connections;
mod download;
mod errors;
mod execution;
mod fleet;
mod flows;
mod inbox;
mod insights;
mod logs;
mod models;
mod routes;
mod seed;
mod state;
mod stats;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::connections::DemoProbe;
use crate::execution::RandomOutcome;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Flowdesk API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Simulation: step delay {:?}, success rate {}, honor action delays {}",
        config.simulation.step_delay,
        config.simulation.success_rate,
        config.simulation.honor_action_delays
    );

    // Step outcomes are random; probes never leave the process
    let outcome = Arc::new(RandomOutcome::new(config.simulation.success_rate));
    let state = AppState::new(config.simulation.clone(), outcome, Arc::new(DemoProbe));

    if config.seed_demo_data {
        seed::seed_demo_data(&state).await?;
    }

    let refresher = state.fleet.clone().spawn_auto_refresh(config.refresh_interval);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! Server fleet monitoring with simulated utilisation refresh.

pub mod handlers;
pub mod refresh;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::fleet::refresh::RefreshGate;
use crate::models::server::{Server, ServerStatus};

/// Utilisation above this marks an online server as degraded.
pub const DEGRADED_THRESHOLD: f64 = 90.0;

const CPU_JITTER: f64 = 10.0;
const MEMORY_JITTER: f64 = 5.0;
const DISK_JITTER: f64 = 1.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Refreshed { servers: Vec<Server> },
    /// Another refresh was already running; nothing changed.
    Skipped,
}

#[derive(Debug, Default)]
pub struct Fleet {
    servers: RwLock<Vec<Server>>,
    gate: RefreshGate,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, server: Server) {
        self.servers.write().await.push(server);
    }

    pub async fn list(&self) -> Vec<Server> {
        self.servers.read().await.clone()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Fleet refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };
        let mut servers = self.servers.write().await;
        apply_jitter(&mut servers, &mut rand::rng());
        RefreshOutcome::Refreshed {
            servers: servers.clone(),
        }
    }

    /// Periodic refresh; abort the handle to stop it.
    pub fn spawn_auto_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Fleet auto-refresh every {}s", every.as_secs());
            let mut tick = tokio::time::interval(every);
            // The first tick fires immediately; seed data is already fresh.
            tick.tick().await;
            loop {
                tick.tick().await;
                if let RefreshOutcome::Skipped = self.refresh().await {
                    warn!("Fleet refresh still running, skipped this tick");
                }
            }
        })
    }
}

/// Random walk within [0, 100]. Offline and maintenance servers keep their
/// readings; the rest are re-classified from the new utilisation.
pub fn apply_jitter<R: Rng + ?Sized>(servers: &mut [Server], rng: &mut R) {
    let now = Utc::now();
    for server in servers.iter_mut() {
        if matches!(server.status, ServerStatus::Offline | ServerStatus::Maintenance) {
            server.last_checked = now;
            continue;
        }
        server.cpu_usage = walk(server.cpu_usage, CPU_JITTER, rng);
        server.memory_usage = walk(server.memory_usage, MEMORY_JITTER, rng);
        server.disk_usage = walk(server.disk_usage, DISK_JITTER, rng);
        server.status = if server.cpu_usage > DEGRADED_THRESHOLD
            || server.memory_usage > DEGRADED_THRESHOLD
        {
            ServerStatus::Degraded
        } else {
            ServerStatus::Online
        };
        let elapsed = (now - server.last_checked).num_seconds().max(0) as u64;
        server.uptime_secs += elapsed;
        server.last_checked = now;
    }
}

fn walk<R: Rng + ?Sized>(value: f64, spread: f64, rng: &mut R) -> f64 {
    (value + rng.random_range(-spread..=spread)).clamp(0.0, 100.0)
}

use std::sync::Arc;

use crate::agenda::{EventStore, TaskStore};
use crate::config::SimulationConfig;
use crate::connections::{ConnectionProbe, ConnectionRegistry};
use crate::execution::{ExecutionSimulator, ExecutionStore, OutcomeSource};
use crate::fleet::Fleet;
use crate::flows::FlowStore;
use crate::inbox::Inbox;
use crate::insights::InsightFeed;
use crate::logs::LogBook;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every store is in-memory; cloning the state clones the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<LogBook>,
    pub flows: Arc<FlowStore>,
    pub executions: Arc<ExecutionStore>,
    pub simulator: Arc<ExecutionSimulator>,
    /// Pluggable probe. Default: DemoProbe, which never dials out.
    pub connections: Arc<ConnectionRegistry>,
    pub fleet: Arc<Fleet>,
    pub inbox: Arc<Inbox>,
    pub tasks: Arc<TaskStore>,
    pub events: Arc<EventStore>,
    pub insights: Arc<InsightFeed>,
}

impl AppState {
    pub fn new(
        simulation: SimulationConfig,
        outcome: Arc<dyn OutcomeSource>,
        probe: Arc<dyn ConnectionProbe>,
    ) -> Self {
        let log = Arc::new(LogBook::new());
        let flows = Arc::new(FlowStore::new(log.clone()));
        let executions = Arc::new(ExecutionStore::new());
        let simulator = Arc::new(ExecutionSimulator::new(
            flows.clone(),
            executions.clone(),
            log.clone(),
            outcome,
            simulation,
        ));
        Self {
            connections: Arc::new(ConnectionRegistry::new(probe, log.clone())),
            log,
            flows,
            executions,
            simulator,
            fleet: Arc::new(Fleet::new()),
            inbox: Arc::new(Inbox::new()),
            tasks: Arc::new(TaskStore::new()),
            events: Arc::new(EventStore::new()),
            insights: Arc::new(InsightFeed::new()),
        }
    }
}

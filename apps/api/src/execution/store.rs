use tokio::sync::RwLock;
use uuid::Uuid;

use crate::flows::store::FinishedRuns;
use crate::models::execution::{
    Engagement, ExecutionError, ExecutionStatus, FollowUpExecution, StepResult,
};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Shared execution list. Concurrent runs write through the lock, and every
/// mutation goes through `FollowUpExecution`'s guarded methods, so a
/// terminal record can no longer change.
#[derive(Debug, Default)]
pub struct ExecutionStore {
    executions: RwLock<Vec<FollowUpExecution>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, execution: FollowUpExecution) {
        self.executions.write().await.push(execution);
    }

    pub async fn get(&self, id: Uuid) -> Result<FollowUpExecution, ExecutionError> {
        self.executions
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(ExecutionError::NotFound(id))
    }

    /// Newest first, optionally restricted to one flow.
    pub async fn list(&self, flow_id: Option<Uuid>) -> Vec<FollowUpExecution> {
        let executions = self.executions.read().await;
        let mut out: Vec<FollowUpExecution> = executions
            .iter()
            .filter(|e| flow_id.map_or(true, |f| e.flow_id == f))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        out
    }

    pub async fn record_step(
        &self,
        id: Uuid,
        result: StepResult,
        engagement: &Engagement,
    ) -> Result<FollowUpExecution, ExecutionError> {
        self.mutate(id, |e| e.record_step(result, engagement)).await
    }

    pub async fn transition(
        &self,
        id: Uuid,
        next: ExecutionStatus,
    ) -> Result<FollowUpExecution, ExecutionError> {
        self.mutate(id, |e| e.transition(next)).await
    }

    /// Completed/failed/converted counts for one flow. Cancelled runs do not
    /// count as finished.
    pub async fn finished_runs(&self, flow_id: Uuid) -> FinishedRuns {
        let executions = self.executions.read().await;
        executions
            .iter()
            .filter(|e| e.flow_id == flow_id)
            .filter(|e| matches!(e.status, ExecutionStatus::Completed | ExecutionStatus::Failed))
            .fold(FinishedRuns::default(), |mut acc, e| {
                acc.finished += 1;
                acc.completed += usize::from(e.status == ExecutionStatus::Completed);
                acc.converted += usize::from(e.metrics.conversion_achieved);
                let mut previous = e.started_at;
                for step in &e.results {
                    let gap = (step.timestamp - previous).num_milliseconds().max(0);
                    acc.step_hours += gap as f64 / MILLIS_PER_HOUR;
                    acc.steps += 1;
                    previous = step.timestamp;
                }
                acc
            })
    }

    async fn mutate<F>(&self, id: Uuid, op: F) -> Result<FollowUpExecution, ExecutionError>
    where
        F: FnOnce(&mut FollowUpExecution) -> Result<(), ExecutionError>,
    {
        let mut executions = self.executions.write().await;
        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ExecutionError::NotFound(id))?;
        op(execution)?;
        Ok(execution.clone())
    }
}

//! Execution simulator: drives a flow's action list against one contact.
//!
//! # Run model
//! - `start` snapshots the flow's actions, records a `running` execution and
//!   spawns one tokio task for it. Many runs may be in flight at once.
//! - Before each step the task suspends for the step delay (`tokio::time`,
//!   never a blocking sleep), then asks the `OutcomeSource` for a result.
//! - The first failed step ends the run as `failed`; earlier successes stay.
//! - `cancel` marks the record `cancelled` immediately and wakes the task,
//!   which stops at the next step boundary. Results already appended stay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::errors::AppError;
use crate::execution::outcome::{OutcomeSource, StepOutcome};
use crate::execution::store::ExecutionStore;
use crate::flows::FlowStore;
use crate::logs::LogBook;
use crate::models::execution::{
    Engagement, ExecutionError, ExecutionStatus, FollowUpExecution, StepResult, StepStatus,
};
use crate::models::flow::FlowAction;
use crate::models::log_entry::{LogEntry, LogLevel};

#[derive(Debug, Clone, Deserialize)]
pub struct RunTarget {
    pub contact_id: String,
    pub contact_name: String,
}

/// A freshly started run: the initial record plus the task driving it.
pub struct Launched {
    pub execution: FollowUpExecution,
    pub handle: JoinHandle<()>,
}

pub struct ExecutionSimulator {
    flows: Arc<FlowStore>,
    executions: Arc<ExecutionStore>,
    log: Arc<LogBook>,
    outcome: Arc<dyn OutcomeSource>,
    config: SimulationConfig,
    cancels: Mutex<HashMap<Uuid, watch::Sender<bool>>>,
}

impl ExecutionSimulator {
    pub fn new(
        flows: Arc<FlowStore>,
        executions: Arc<ExecutionStore>,
        log: Arc<LogBook>,
        outcome: Arc<dyn OutcomeSource>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            flows,
            executions,
            log,
            outcome,
            config,
            cancels: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start(self: &Arc<Self>, flow_id: Uuid, target: RunTarget) -> Result<Launched, AppError> {
        if target.contact_name.trim().is_empty() {
            return Err(AppError::Validation("contact_name cannot be empty".to_string()));
        }
        if target.contact_id.trim().is_empty() {
            return Err(AppError::Validation("contact_id cannot be empty".to_string()));
        }

        let flow = self.flows.get(flow_id).await?;
        let actions = flow.actions.clone();
        let execution = FollowUpExecution::start(
            flow_id,
            target.contact_id,
            target.contact_name,
            actions.len(),
        );
        let id = execution.id;

        // Count the run against the flow first: if the flow vanished since
        // `get`, nothing has been recorded yet.
        self.flows
            .record_execution_started(flow_id, execution.started_at)
            .await?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.lock_cancels().insert(id, cancel_tx);
        self.executions.insert(execution.clone()).await;

        info!(execution_id = %id, flow_id = %flow_id, steps = actions.len(), "Execution started");
        self.activity(
            LogLevel::Info,
            format!(
                "Flow '{}' started for {}",
                flow.name, execution.contact_name
            ),
            &execution,
        )
        .await;

        let sim = Arc::clone(self);
        let handle = tokio::spawn(async move { sim.drive(id, flow_id, actions, cancel_rx).await });

        Ok(Launched { execution, handle })
    }

    pub async fn cancel(&self, id: Uuid) -> Result<FollowUpExecution, AppError> {
        let execution = self
            .executions
            .transition(id, ExecutionStatus::Cancelled)
            .await?;
        if let Some(tx) = self.lock_cancels().remove(&id) {
            let _ = tx.send(true);
        }
        info!(execution_id = %id, step = execution.current_step, "Execution cancelled");
        self.activity(LogLevel::Warn, "Execution cancelled".to_string(), &execution)
            .await;
        Ok(execution)
    }

    async fn drive(
        &self,
        id: Uuid,
        flow_id: Uuid,
        actions: Vec<FlowAction>,
        cancel_rx: watch::Receiver<bool>,
    ) {
        self.step_through(id, flow_id, &actions, cancel_rx).await;
        self.lock_cancels().remove(&id);
    }

    async fn step_through(
        &self,
        id: Uuid,
        flow_id: Uuid,
        actions: &[FlowAction],
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        for (idx, action) in actions.iter().enumerate() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay_for(action)) => {}
                _ = cancel_rx.changed() => {
                    debug!(execution_id = %id, step = idx, "Run stopped while waiting");
                    return;
                }
            }

            let outcome = self.outcome.perform(idx, action).await;
            let (result, engagement, failed) = step_result(idx, action, outcome);

            let execution = match self.executions.record_step(id, result, &engagement).await {
                Ok(execution) => execution,
                Err(ExecutionError::AlreadyTerminal(status)) => {
                    debug!(execution_id = %id, ?status, "Step discarded, run already over");
                    return;
                }
                Err(e) => {
                    warn!(execution_id = %id, error = %e, "Could not record step");
                    return;
                }
            };

            if failed {
                self.activity(
                    LogLevel::Error,
                    format!("Step {} ({}) failed", idx + 1, action.action_type.as_str()),
                    &execution,
                )
                .await;
                self.conclude(id, flow_id, ExecutionStatus::Failed).await;
                return;
            }
            self.activity(
                LogLevel::Debug,
                format!("Step {} ({}) succeeded", idx + 1, action.action_type.as_str()),
                &execution,
            )
            .await;
        }

        self.conclude(id, flow_id, ExecutionStatus::Completed).await;
    }

    async fn conclude(&self, id: Uuid, flow_id: Uuid, status: ExecutionStatus) {
        match self.executions.transition(id, status).await {
            Ok(execution) => {
                info!(execution_id = %id, ?status, steps = execution.current_step, "Execution finished");
                let level = if status == ExecutionStatus::Failed {
                    LogLevel::Error
                } else {
                    LogLevel::Info
                };
                self.activity(level, format!("Execution {}", status_label(status)), &execution)
                    .await;
            }
            Err(e) => {
                debug!(execution_id = %id, error = %e, "Execution already concluded");
                return;
            }
        }
        let runs = self.executions.finished_runs(flow_id).await;
        self.flows.record_execution_finished(flow_id, runs).await;
    }

    fn delay_for(&self, action: &FlowAction) -> Duration {
        match action.delay_minutes {
            Some(minutes) if self.config.honor_action_delays => {
                Duration::from_secs(u64::from(minutes) * 60)
            }
            _ => self.config.step_delay,
        }
    }

    fn lock_cancels(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, watch::Sender<bool>>> {
        // A poisoned map only holds senders; keep using it.
        self.cancels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn activity(&self, level: LogLevel, message: String, execution: &FollowUpExecution) {
        let elapsed = (Utc::now() - execution.started_at).num_milliseconds().max(0) as u64;
        let mut entry = LogEntry::new(level, "executions", message).with_details(json!({
            "execution_id": execution.id,
            "flow_id": execution.flow_id,
            "contact_id": execution.contact_id,
            "step": execution.current_step,
            "total_steps": execution.total_steps,
        }));
        entry.duration_ms = Some(elapsed);
        self.log.append(entry).await;
    }
}

fn step_result(idx: usize, action: &FlowAction, outcome: StepOutcome) -> (StepResult, Engagement, bool) {
    let mut result = StepResult {
        step_id: format!("step-{}", idx + 1),
        action: action.action_type,
        status: StepStatus::Success,
        timestamp: Utc::now(),
        response: None,
        error: None,
    };
    match outcome {
        StepOutcome::Success {
            response,
            engagement,
        } => {
            result.response = Some(response);
            (result, engagement, false)
        }
        StepOutcome::Failure { error } => {
            result.status = StepStatus::Failed;
            result.error = Some(error);
            (result, Engagement::default(), true)
        }
    }
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Pending => "pending",
        ExecutionStatus::Running => "running",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ScriptedOutcome;
    use crate::flows::NewFlow;
    use crate::models::flow::{ActionType, AiSettings, Channel};

    const STEP: Duration = Duration::from_millis(1500);

    struct Harness {
        sim: Arc<ExecutionSimulator>,
        flows: Arc<FlowStore>,
        executions: Arc<ExecutionStore>,
    }

    fn harness(outcome: ScriptedOutcome) -> Harness {
        let log = Arc::new(LogBook::new());
        let flows = Arc::new(FlowStore::new(log.clone()));
        let executions = Arc::new(ExecutionStore::new());
        let sim = Arc::new(ExecutionSimulator::new(
            flows.clone(),
            executions.clone(),
            log,
            Arc::new(outcome),
            SimulationConfig {
                step_delay: STEP,
                honor_action_delays: false,
                success_rate: 1.0,
            },
        ));
        Harness {
            sim,
            flows,
            executions,
        }
    }

    fn message(text: &str) -> FlowAction {
        FlowAction {
            action_type: ActionType::SendMessage,
            channel: Some(Channel::Whatsapp),
            content: Some(text.to_string()),
            delay_minutes: Some(30),
            conditions: None,
        }
    }

    async fn flow_with(h: &Harness, steps: usize) -> Uuid {
        h.flows
            .create(NewFlow {
                name: "Sequence".to_string(),
                description: String::new(),
                triggers: vec![],
                actions: (0..steps).map(|i| message(&format!("msg {i}"))).collect(),
                ai_settings: AiSettings::default(),
            })
            .await
            .unwrap()
            .id
    }

    fn target() -> RunTarget {
        RunTarget {
            contact_id: "contact-7".to_string(),
            contact_name: "Bruna".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_steps_succeed() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 3).await;

        let launched = h.sim.start(flow_id, target()).await.unwrap();
        assert_eq!(launched.execution.status, ExecutionStatus::Running);
        assert_eq!(launched.execution.total_steps, 3);
        assert_eq!(launched.execution.current_step, 0);
        launched.handle.await.unwrap();

        let e = h.executions.get(launched.execution.id).await.unwrap();
        assert_eq!(e.status, ExecutionStatus::Completed);
        assert_eq!(e.results.len(), 3);
        assert_eq!(e.current_step, 3);
        assert!(e.completed_at.is_some());
        assert_eq!(e.results[2].step_id, "step-3");

        let flow = h.flows.get(flow_id).await.unwrap();
        assert_eq!(flow.analytics.total_executions, 1);
        assert_eq!(flow.analytics.success_rate, 100.0);
        assert_eq!(flow.analytics.last_execution, Some(e.started_at));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_halts_remaining_steps() {
        let h = harness(ScriptedOutcome::new([true, false, true]));
        let flow_id = flow_with(&h, 4).await;

        let launched = h.sim.start(flow_id, target()).await.unwrap();
        launched.handle.await.unwrap();

        let e = h.executions.get(launched.execution.id).await.unwrap();
        assert_eq!(e.status, ExecutionStatus::Failed);
        assert_eq!(e.results.len(), 2);
        assert_eq!(e.current_step, 2);
        assert_eq!(e.results[0].status, StepStatus::Success);
        assert_eq!(e.results[1].status, StepStatus::Failed);
        assert!(e.results[1].error.is_some());
        assert_eq!(h.flows.get(flow_id).await.unwrap().analytics.success_rate, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_observable_between_steps() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 3).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        let id = launched.execution.id;

        tokio::time::sleep(STEP + Duration::from_millis(10)).await;
        let mid = h.executions.get(id).await.unwrap();
        assert_eq!(mid.status, ExecutionStatus::Running);
        assert_eq!(mid.current_step, 1);
        assert_eq!(mid.results.len(), mid.current_step);

        launched.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_keeps_partial_results() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 5).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        let id = launched.execution.id;

        tokio::time::sleep(STEP * 2 + Duration::from_millis(10)).await;
        let cancelled = h.sim.cancel(id).await.unwrap();
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());
        launched.handle.await.unwrap();

        let e = h.executions.get(id).await.unwrap();
        assert_eq!(e.status, ExecutionStatus::Cancelled);
        assert_eq!(e.results.len(), 2);
        assert_eq!(e, cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_handles_released_on_every_exit() {
        let h = harness(ScriptedOutcome::new([true, false]));
        let failing = flow_with(&h, 3).await;
        let launched = h.sim.start(failing, target()).await.unwrap();
        assert_eq!(h.sim.lock_cancels().len(), 1);
        launched.handle.await.unwrap();
        assert!(h.sim.lock_cancels().is_empty());

        // Record closed behind the simulator's back: the step is discarded.
        let launched = h.sim.start(failing, target()).await.unwrap();
        let id = launched.execution.id;
        h.executions
            .transition(id, ExecutionStatus::Cancelled)
            .await
            .unwrap();
        launched.handle.await.unwrap();
        assert!(h.sim.lock_cancels().is_empty());
        assert!(h.executions.get(id).await.unwrap().results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_on_deleted_flow_leaves_no_record() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 2).await;
        h.flows.delete(flow_id, true).await.unwrap();

        assert!(matches!(
            h.sim.start(flow_id, target()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(h.executions.list(None).await.is_empty());
        assert!(h.sim.lock_cancels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_twice_is_rejected() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 2).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        h.sim.cancel(launched.execution.id).await.unwrap();
        let err = h.sim.cancel(launched.execution.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        launched.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_is_frozen() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 1).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        launched.handle.await.unwrap();

        let before = h.executions.get(launched.execution.id).await.unwrap();
        assert!(h.sim.cancel(before.id).await.is_err());
        assert_eq!(h.executions.get(before.id).await.unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_steps_is_a_snapshot() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 2).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();

        h.flows
            .update(
                flow_id,
                crate::flows::FlowPatch {
                    actions: Some((0..6).map(|i| message(&format!("new {i}"))).collect()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        launched.handle.await.unwrap();

        let e = h.executions.get(launched.execution.id).await.unwrap();
        assert_eq!(e.total_steps, 2);
        assert_eq!(e.results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_runs_are_independent() {
        let h = harness(ScriptedOutcome::new([true, false]));
        let flow_id = flow_with(&h, 3).await;
        let a = h.sim.start(flow_id, target()).await.unwrap();
        let b = h.sim.start(flow_id, target()).await.unwrap();
        a.handle.await.unwrap();
        b.handle.await.unwrap();

        let runs = h.executions.list(Some(flow_id)).await;
        assert_eq!(runs.len(), 2);
        let failed = runs
            .iter()
            .filter(|e| e.status == ExecutionStatus::Failed)
            .count();
        assert_eq!(failed, 1);
        for e in &runs {
            assert!(e.results.len() <= e.total_steps);
            assert_eq!(e.current_step, e.results.len());
        }
        let flow = h.flows.get(flow_id).await.unwrap();
        assert_eq!(flow.analytics.total_executions, 2);
        assert_eq!(flow.analytics.success_rate, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engagement_feeds_metrics() {
        let engaged = Engagement {
            opened: true,
            clicked: true,
            responded: false,
            converted: true,
        };
        let h = harness(ScriptedOutcome::always_succeed().with_engagement(engaged));
        let flow_id = flow_with(&h, 2).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        launched.handle.await.unwrap();

        let e = h.executions.get(launched.execution.id).await.unwrap();
        assert_eq!(e.metrics.messages_opened, 2);
        assert_eq!(e.metrics.links_clicked, 2);
        assert_eq!(e.metrics.responses_received, 0);
        assert!(e.metrics.conversion_achieved);
        assert_eq!(h.flows.get(flow_id).await.unwrap().analytics.conversion_rate, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_flow_completes_immediately() {
        let h = harness(ScriptedOutcome::always_succeed());
        let flow_id = flow_with(&h, 0).await;
        let launched = h.sim.start(flow_id, target()).await.unwrap();
        launched.handle.await.unwrap();
        let e = h.executions.get(launched.execution.id).await.unwrap();
        assert_eq!(e.status, ExecutionStatus::Completed);
        assert!(e.results.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_flow_and_blank_contact() {
        let h = harness(ScriptedOutcome::always_succeed());
        assert!(matches!(
            h.sim.start(Uuid::new_v4(), target()).await,
            Err(AppError::NotFound(_))
        ));
        let flow_id = flow_with(&h, 1).await;
        let blank = RunTarget {
            contact_id: "c".to_string(),
            contact_name: "  ".to_string(),
        };
        assert!(matches!(
            h.sim.start(flow_id, blank).await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_action_delays_only_when_enabled() {
        let h = harness(ScriptedOutcome::always_succeed());
        assert_eq!(h.sim.delay_for(&message("x")), STEP);

        let honoring = ExecutionSimulator::new(
            h.flows.clone(),
            h.executions.clone(),
            Arc::new(LogBook::new()),
            Arc::new(ScriptedOutcome::always_succeed()),
            SimulationConfig {
                step_delay: STEP,
                honor_action_delays: true,
                success_rate: 1.0,
            },
        );
        assert_eq!(honoring.delay_for(&message("x")), Duration::from_secs(30 * 60));
    }
}

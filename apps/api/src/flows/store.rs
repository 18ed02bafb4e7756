use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::logs::LogBook;
use crate::models::flow::{AiSettings, FlowAction, FlowStatus, FollowUpFlow, Trigger};
use crate::models::log_entry::{LogEntry, LogLevel};

pub const DUPLICATE_SUFFIX: &str = "(Copy)";

#[derive(Debug, Clone, Deserialize)]
pub struct NewFlow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub actions: Vec<FlowAction>,
    #[serde(default)]
    pub ai_settings: AiSettings,
}

/// Partial edit. Status is deliberately absent: it only moves through
/// `activate`/`pause`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub triggers: Option<Vec<Trigger>>,
    pub actions: Option<Vec<FlowAction>>,
    pub ai_settings: Option<AiSettings>,
}

/// Counts over one flow's finished executions, used to recompute its rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinishedRuns {
    pub finished: usize,
    pub completed: usize,
    pub converted: usize,
    /// Steps recorded across those runs and the hours they took in total.
    pub steps: usize,
    pub step_hours: f64,
}

/// Ordered, in-memory flow collection. Every mutation happens under the
/// write lock so concurrent executions can update analytics safely.
pub struct FlowStore {
    flows: RwLock<Vec<FollowUpFlow>>,
    log: Arc<LogBook>,
}

/// Required-field gate shared by create, update and import.
pub fn validate_definition(name: &str, actions: &[FlowAction]) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    for (idx, action) in actions.iter().enumerate() {
        let needs_content = action.action_type.reaches_contact();
        let has_content = action
            .content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if needs_content && !has_content {
            return Err(AppError::Validation(format!(
                "action {} ({}) requires content",
                idx + 1,
                action.action_type.as_str()
            )));
        }
    }
    Ok(())
}

impl FlowStore {
    pub fn new(log: Arc<LogBook>) -> Self {
        Self {
            flows: RwLock::new(Vec::new()),
            log,
        }
    }

    pub async fn list(&self) -> Vec<FollowUpFlow> {
        self.flows.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Result<FollowUpFlow, AppError> {
        self.flows
            .read()
            .await
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, new: NewFlow) -> Result<FollowUpFlow, AppError> {
        validate_definition(&new.name, &new.actions)?;
        let flow = FollowUpFlow::new_draft(
            new.name.trim().to_string(),
            new.description,
            new.triggers,
            new.actions,
            new.ai_settings,
        );
        self.flows.write().await.push(flow.clone());
        info!(flow_id = %flow.id, "Flow created");
        self.activity(LogLevel::Info, format!("Flow '{}' created", flow.name), flow.id)
            .await;
        Ok(flow)
    }

    pub async fn update(&self, id: Uuid, patch: FlowPatch) -> Result<FollowUpFlow, AppError> {
        let mut flows = self.flows.write().await;
        let flow = flows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found(id))?;

        let name = patch.name.as_deref().unwrap_or(&flow.name);
        let actions = patch.actions.as_deref().unwrap_or(&flow.actions);
        validate_definition(name, actions)?;

        if let Some(name) = patch.name {
            flow.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            flow.description = description;
        }
        if let Some(triggers) = patch.triggers {
            flow.triggers = triggers;
        }
        if let Some(actions) = patch.actions {
            flow.actions = actions;
        }
        if let Some(ai_settings) = patch.ai_settings {
            flow.ai_settings = ai_settings;
        }
        flow.updated_at = Utc::now();
        let updated = flow.clone();
        drop(flows);

        self.activity(LogLevel::Info, format!("Flow '{}' updated", updated.name), id)
            .await;
        Ok(updated)
    }

    pub async fn activate(&self, id: Uuid) -> Result<FollowUpFlow, AppError> {
        self.set_status(id, FlowStatus::Active).await
    }

    pub async fn pause(&self, id: Uuid) -> Result<FollowUpFlow, AppError> {
        self.set_status(id, FlowStatus::Paused).await
    }

    async fn set_status(&self, id: Uuid, target: FlowStatus) -> Result<FollowUpFlow, AppError> {
        let mut flows = self.flows.write().await;
        let flow = flows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found(id))?;

        let changed = flow.status.transition(target)?;
        if !changed {
            return Ok(flow.clone());
        }
        flow.status = target;
        flow.updated_at = Utc::now();
        let updated = flow.clone();
        drop(flows);

        info!(flow_id = %id, status = ?target, "Flow status changed");
        self.activity(
            LogLevel::Info,
            format!("Flow '{}' is now {}", updated.name, target.as_str()),
            id,
        )
        .await;
        Ok(updated)
    }

    /// Inserts a draft copy right after the original.
    pub async fn duplicate(&self, id: Uuid) -> Result<FollowUpFlow, AppError> {
        let mut flows = self.flows.write().await;
        let idx = flows
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| not_found(id))?;
        let copy = flows[idx].duplicate(DUPLICATE_SUFFIX);
        flows.insert(idx + 1, copy.clone());
        drop(flows);

        self.activity(
            LogLevel::Info,
            format!("Flow '{}' duplicated", copy.name),
            copy.id,
        )
        .await;
        Ok(copy)
    }

    /// Irreversible. Refuses to act unless the caller confirmed.
    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<FollowUpFlow, AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(format!(
                "Deleting flow {id} cannot be undone; repeat with confirm=true"
            )));
        }
        let mut flows = self.flows.write().await;
        let idx = flows
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = flows.remove(idx);
        drop(flows);

        info!(flow_id = %id, "Flow deleted");
        self.activity(LogLevel::Warn, format!("Flow '{}' deleted", removed.name), id)
            .await;
        Ok(removed)
    }

    /// Appends already-validated flows in one step: either all land or none.
    pub async fn append_all(&self, incoming: Vec<FollowUpFlow>) -> Vec<FollowUpFlow> {
        self.flows.write().await.extend(incoming.iter().cloned());
        for flow in &incoming {
            self.activity(LogLevel::Info, format!("Flow '{}' imported", flow.name), flow.id)
                .await;
        }
        incoming
    }

    /// Analytics bookkeeping; does not touch `updated_at`.
    pub async fn record_execution_started(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut flows = self.flows.write().await;
        let flow = flows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found(id))?;
        flow.analytics.total_executions += 1;
        flow.analytics.last_execution = Some(started_at);
        Ok(())
    }

    /// Recomputes the flow's rates. A flow deleted mid-run is ignored.
    pub async fn record_execution_finished(&self, id: Uuid, runs: FinishedRuns) {
        if runs.finished == 0 {
            return;
        }
        let mut flows = self.flows.write().await;
        if let Some(flow) = flows.iter_mut().find(|f| f.id == id) {
            let finished = runs.finished as f64;
            flow.analytics.success_rate = runs.completed as f64 / finished * 100.0;
            flow.analytics.conversion_rate = runs.converted as f64 / finished * 100.0;
            if runs.steps > 0 {
                flow.analytics.avg_response_time = runs.step_hours / runs.steps as f64;
            }
        }
    }

    async fn activity(&self, level: LogLevel, message: String, flow_id: Uuid) {
        self.log
            .append(LogEntry::new(level, "flows", message).with_details(json!({ "flow_id": flow_id })))
            .await;
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Flow {id} not found"))
}

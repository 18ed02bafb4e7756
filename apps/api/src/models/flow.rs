use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Draft,
    Active,
    Paused,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot move flow from {from:?} to {to:?}")]
pub struct FlowTransitionError {
    pub from: FlowStatus,
    pub to: FlowStatus,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Active => "active",
            FlowStatus::Paused => "paused",
        }
    }

    /// Validates a status change. `Ok(false)` means the flow is already in
    /// the target state and nothing should change.
    ///
    /// Draft is pre-activation only: publishing moves it to active, and no
    /// path ever leads back into it.
    pub fn transition(self, to: FlowStatus) -> Result<bool, FlowTransitionError> {
        use FlowStatus::*;
        match (self, to) {
            (a, b) if a == b => Ok(false),
            (Draft, Active) | (Active, Paused) | (Paused, Active) => Ok(true),
            (from, to) => Err(FlowTransitionError { from, to }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    TimeDelay,
    NoResponse,
    Webhook,
    Interaction,
    StatusChange,
    DateBased,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    pub condition: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    SendEmail,
    SendSms,
    CreateTask,
    AssignTag,
    ChangeStatus,
    Webhook,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendMessage => "send_message",
            ActionType::SendEmail => "send_email",
            ActionType::SendSms => "send_sms",
            ActionType::CreateTask => "create_task",
            ActionType::AssignTag => "assign_tag",
            ActionType::ChangeStatus => "change_status",
            ActionType::Webhook => "webhook",
        }
    }

    /// Actions that put a message in front of the contact and can therefore
    /// be opened, clicked or answered.
    pub fn reaches_contact(&self) -> bool {
        matches!(
            self,
            ActionType::SendMessage | ActionType::SendEmail | ActionType::SendSms
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    Instagram,
    Telegram,
    Email,
    Sms,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowAnalytics {
    pub total_executions: u64,
    /// Percentage in [0, 100].
    pub success_rate: f64,
    /// Percentage in [0, 100]. Not bounded by `success_rate`.
    pub conversion_rate: f64,
    /// Mean hours per executed step over finished runs, measured from the
    /// previous step (or the run start) to the step's timestamp.
    pub avg_response_time: f64,
    pub last_execution: Option<DateTime<Utc>>,
}

impl FlowAnalytics {
    /// Range check for analytics that arrive from outside, e.g. an import.
    pub fn check_ranges(&self) -> Result<(), String> {
        for (label, rate) in [
            ("success_rate", self.success_rate),
            ("conversion_rate", self.conversion_rate),
        ] {
            if !(0.0..=100.0).contains(&rate) {
                return Err(format!("{label} must be within 0 and 100, got {rate}"));
            }
        }
        if self.avg_response_time.is_nan() || self.avg_response_time < 0.0 {
            return Err(format!(
                "avg_response_time cannot be negative, got {}",
                self.avg_response_time
            ));
        }
        Ok(())
    }
}

/// Independent feature flags. Sub-flags may be set while `enabled` is false.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiSettings {
    pub enabled: bool,
    pub personalization: bool,
    pub sentiment_analysis: bool,
    pub predictive_optimization: bool,
    pub auto_optimize_time: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpFlow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: FlowStatus,
    pub triggers: Vec<Trigger>,
    pub actions: Vec<FlowAction>,
    pub analytics: FlowAnalytics,
    pub ai_settings: AiSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowUpFlow {
    pub fn new_draft(
        name: String,
        description: String,
        triggers: Vec<Trigger>,
        actions: Vec<FlowAction>,
        ai_settings: AiSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            status: FlowStatus::Draft,
            triggers,
            actions,
            analytics: FlowAnalytics::default(),
            ai_settings,
            created_at: now,
            updated_at: now,
        }
    }

    /// A fresh draft carrying the same definition with zeroed analytics.
    pub fn duplicate(&self, name_suffix: &str) -> Self {
        Self::new_draft(
            format!("{} {}", self.name, name_suffix),
            self.description.clone(),
            self.triggers.clone(),
            self.actions.clone(),
            self.ai_settings.clone(),
        )
    }
}

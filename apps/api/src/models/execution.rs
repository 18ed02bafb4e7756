use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::flow::ActionType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }

    /// Forward-only: pending → running → {completed | failed | cancelled}.
    /// A pending run may also be cancelled before it starts.
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Cancelled) | (Running, Completed | Failed | Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub step_id: String,
    pub action: ActionType,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Contact engagement observed for a single step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Engagement {
    pub opened: bool,
    pub clicked: bool,
    pub responded: bool,
    pub converted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionMetrics {
    pub messages_opened: u32,
    pub links_clicked: u32,
    pub responses_received: u32,
    pub conversion_achieved: bool,
}

impl ExecutionMetrics {
    /// Counters only grow and a conversion never un-happens.
    pub fn absorb(&mut self, engagement: &Engagement) {
        self.messages_opened += u32::from(engagement.opened);
        self.links_clicked += u32::from(engagement.clicked);
        self.responses_received += u32::from(engagement.responded);
        self.conversion_achieved |= engagement.converted;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("execution {0} not found")]
    NotFound(Uuid),

    #[error("execution is already {0:?}")]
    AlreadyTerminal(ExecutionStatus),

    #[error("cannot move execution from {from:?} to {to:?}")]
    InvalidTransition {
        from: ExecutionStatus,
        to: ExecutionStatus,
    },

    #[error("execution already recorded all {0} steps")]
    StepOverflow(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpExecution {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub contact_id: String,
    pub contact_name: String,
    pub status: ExecutionStatus,
    /// Always equal to `results.len()`.
    pub current_step: usize,
    /// Snapshot of the flow's action count when the run started.
    pub total_steps: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<StepResult>,
    pub metrics: ExecutionMetrics,
}

impl FollowUpExecution {
    pub fn start(flow_id: Uuid, contact_id: String, contact_name: String, total_steps: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow_id,
            contact_id,
            contact_name,
            status: ExecutionStatus::Running,
            current_step: 0,
            total_steps,
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
            metrics: ExecutionMetrics::default(),
        }
    }

    /// Appends one processed step. Refused once the run is terminal or every
    /// step has been recorded.
    pub fn record_step(
        &mut self,
        result: StepResult,
        engagement: &Engagement,
    ) -> Result<(), ExecutionError> {
        if self.status.is_terminal() {
            return Err(ExecutionError::AlreadyTerminal(self.status));
        }
        if self.results.len() >= self.total_steps {
            return Err(ExecutionError::StepOverflow(self.total_steps));
        }
        self.results.push(result);
        self.current_step = self.results.len();
        self.metrics.absorb(engagement);
        Ok(())
    }

    pub fn transition(&mut self, next: ExecutionStatus) -> Result<(), ExecutionError> {
        if self.status.is_terminal() {
            return Err(ExecutionError::AlreadyTerminal(self.status));
        }
        if !self.status.can_transition_to(next) {
            return Err(ExecutionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(status: StepStatus) -> StepResult {
        StepResult {
            step_id: "step-1".to_string(),
            action: ActionType::SendMessage,
            status,
            timestamp: Utc::now(),
            response: None,
            error: None,
        }
    }

    fn running(total: usize) -> FollowUpExecution {
        FollowUpExecution::start(Uuid::new_v4(), "c-1".into(), "Ana".into(), total)
    }

    #[test]
    fn test_status_forward_only() {
        assert!(ExecutionStatus::Pending.can_transition_to(ExecutionStatus::Running));
        assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Failed));
        assert!(!ExecutionStatus::Running.can_transition_to(ExecutionStatus::Pending));
        assert!(!ExecutionStatus::Completed.can_transition_to(ExecutionStatus::Running));
    }

    #[test]
    fn test_record_step_tracks_current_step() {
        let mut e = running(2);
        e.record_step(step(StepStatus::Success), &Engagement::default())
            .unwrap();
        assert_eq!(e.current_step, 1);
        assert_eq!(e.results.len(), 1);
    }

    #[test]
    fn test_record_step_rejects_overflow() {
        let mut e = running(1);
        e.record_step(step(StepStatus::Success), &Engagement::default())
            .unwrap();
        let err = e
            .record_step(step(StepStatus::Success), &Engagement::default())
            .unwrap_err();
        assert_eq!(err, ExecutionError::StepOverflow(1));
    }

    #[test]
    fn test_terminal_execution_is_frozen() {
        let mut e = running(3);
        e.transition(ExecutionStatus::Cancelled).unwrap();
        assert!(e.completed_at.is_some());
        let engaged = Engagement {
            opened: true,
            ..Engagement::default()
        };
        assert!(e.record_step(step(StepStatus::Success), &engaged).is_err());
        assert!(e.transition(ExecutionStatus::Completed).is_err());
        assert!(e.results.is_empty());
        assert_eq!(e.metrics, ExecutionMetrics::default());
    }

    #[test]
    fn test_conversion_never_resets() {
        let mut m = ExecutionMetrics::default();
        m.absorb(&Engagement {
            opened: true,
            converted: true,
            ..Engagement::default()
        });
        m.absorb(&Engagement::default());
        assert!(m.conversion_achieved);
        assert_eq!(m.messages_opened, 1);
    }
}

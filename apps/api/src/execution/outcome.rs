use async_trait::async_trait;
use rand::Rng;

use crate::models::execution::Engagement;
use crate::models::flow::{ActionType, FlowAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success {
        response: String,
        engagement: Engagement,
    },
    Failure {
        error: String,
    },
}

/// Decides how a single step turns out. Implement this to swap the random
/// demo behaviour for scripted tests or, eventually, real channel calls.
#[async_trait]
pub trait OutcomeSource: Send + Sync {
    async fn perform(&self, step: usize, action: &FlowAction) -> StepOutcome;
}

// ────────────────────────────────────────────────────────────────────────────
// RandomOutcome: demo default
// ────────────────────────────────────────────────────────────────────────────

/// Succeeds with probability `success_rate`; successful contact-facing steps
/// draw engagement at fixed demo odds.
pub struct RandomOutcome {
    success_rate: f64,
}

const OPEN_ODDS: f64 = 0.7;
const CLICK_ODDS: f64 = 0.35;
const RESPONSE_ODDS: f64 = 0.25;
const CONVERSION_ODDS: f64 = 0.1;

impl RandomOutcome {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    fn draw(&self, action: &FlowAction) -> StepOutcome {
        let mut rng = rand::rng();
        if !rng.random_bool(self.success_rate) {
            return StepOutcome::Failure {
                error: format!("{} failed: simulated delivery error", action.action_type.as_str()),
            };
        }

        let engagement = if action.action_type.reaches_contact() {
            let opened = rng.random_bool(OPEN_ODDS);
            let clicked = opened && rng.random_bool(CLICK_ODDS);
            let responded = opened && rng.random_bool(RESPONSE_ODDS);
            Engagement {
                opened,
                clicked,
                responded,
                converted: clicked && rng.random_bool(CONVERSION_ODDS),
            }
        } else {
            Engagement::default()
        };

        StepOutcome::Success {
            response: success_response(action),
            engagement,
        }
    }
}

#[async_trait]
impl OutcomeSource for RandomOutcome {
    async fn perform(&self, _step: usize, action: &FlowAction) -> StepOutcome {
        self.draw(action)
    }
}

pub(crate) fn success_response(action: &FlowAction) -> String {
    let via = action
        .channel
        .map(|c| format!(" via {c:?}").to_lowercase())
        .unwrap_or_default();
    match action.action_type {
        ActionType::SendMessage | ActionType::SendEmail | ActionType::SendSms => {
            format!("message delivered{via}")
        }
        ActionType::CreateTask => "task created".to_string(),
        ActionType::AssignTag => "tag assigned".to_string(),
        ActionType::ChangeStatus => "status changed".to_string(),
        ActionType::Webhook => "webhook acknowledged (200)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ScriptedOutcome;
    use crate::models::flow::Channel;

    fn message() -> FlowAction {
        FlowAction {
            action_type: ActionType::SendMessage,
            channel: Some(Channel::Whatsapp),
            content: Some("hello".to_string()),
            delay_minutes: None,
            conditions: None,
        }
    }

    #[tokio::test]
    async fn test_random_extremes_are_deterministic() {
        let never = RandomOutcome::new(0.0);
        let always = RandomOutcome::new(1.0);
        for step in 0..20 {
            assert!(matches!(
                never.perform(step, &message()).await,
                StepOutcome::Failure { .. }
            ));
            assert!(matches!(
                always.perform(step, &message()).await,
                StepOutcome::Success { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_non_contact_steps_never_engage() {
        let source = RandomOutcome::new(1.0);
        let tag = FlowAction {
            action_type: ActionType::AssignTag,
            channel: None,
            content: None,
            delay_minutes: None,
            conditions: None,
        };
        for step in 0..20 {
            match source.perform(step, &tag).await {
                StepOutcome::Success { engagement, .. } => {
                    assert_eq!(engagement, Engagement::default())
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_script_plays_back_then_succeeds() {
        let source = ScriptedOutcome::new([true, false]);
        assert!(matches!(source.perform(0, &message()).await, StepOutcome::Success { .. }));
        assert_eq!(
            source.perform(1, &message()).await,
            StepOutcome::Failure {
                error: "scripted failure at step 2".to_string()
            }
        );
        assert!(matches!(source.perform(2, &message()).await, StepOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_success_response_names_channel() {
        match ScriptedOutcome::always_succeed().perform(0, &message()).await {
            StepOutcome::Success { response, .. } => {
                assert_eq!(response, "message delivered via whatsapp")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

// Deterministic step outcomes for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::execution::outcome::{success_response, OutcomeSource, StepOutcome};
use crate::models::execution::Engagement;
use crate::models::flow::FlowAction;

/// Plays back a fixed success/failure script; succeeds once the script runs
/// out. Successful contact-facing steps report `engagement`.
pub struct ScriptedOutcome {
    script: Mutex<VecDeque<bool>>,
    engagement: Engagement,
}

impl ScriptedOutcome {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            engagement: Engagement::default(),
        }
    }

    pub fn always_succeed() -> Self {
        Self::new(Vec::<bool>::new())
    }

    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement;
        self
    }
}

#[async_trait]
impl OutcomeSource for ScriptedOutcome {
    async fn perform(&self, step: usize, action: &FlowAction) -> StepOutcome {
        let succeed = self
            .script
            .lock()
            .map(|mut script| script.pop_front().unwrap_or(true))
            .unwrap_or(true);
        if succeed {
            StepOutcome::Success {
                response: success_response(action),
                engagement: if action.action_type.reaches_contact() {
                    self.engagement
                } else {
                    Engagement::default()
                },
            }
        } else {
            StepOutcome::Failure {
                error: format!("scripted failure at step {}", step + 1),
            }
        }
    }
}

//! AI insight feed. Insights are append-only: there is no update path.

pub mod handlers;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::insight::{AiInsight, Impact, InsightType};

pub const MAX_CONFIDENCE: u8 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewInsight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub impact: Impact,
    pub confidence: u8,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub suggested_action: Option<String>,
}

/// Highest impact first, then newest.
pub fn sort_by_priority(insights: &mut [AiInsight]) {
    insights.sort_by(|a, b| {
        b.impact
            .cmp(&a.impact)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[derive(Debug, Default)]
pub struct InsightFeed {
    insights: RwLock<Vec<AiInsight>>,
}

impl InsightFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<AiInsight> {
        let mut insights = self.insights.read().await.clone();
        sort_by_priority(&mut insights);
        insights
    }

    pub async fn create(&self, new: NewInsight) -> Result<AiInsight, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if new.confidence > MAX_CONFIDENCE {
            return Err(AppError::Validation(format!(
                "confidence must be between 0 and {MAX_CONFIDENCE}"
            )));
        }
        let suggested_action = new
            .suggested_action
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if new.actionable && suggested_action.is_none() {
            return Err(AppError::Validation(
                "actionable insights need a suggested action".to_string(),
            ));
        }
        let insight = AiInsight {
            id: Uuid::new_v4(),
            insight_type: new.insight_type,
            title: new.title.trim().to_string(),
            description: new.description,
            impact: new.impact,
            confidence: new.confidence,
            actionable: new.actionable,
            suggested_action,
            created_at: Utc::now(),
        };
        self.insights.write().await.push(insight.clone());
        Ok(insight)
    }
}

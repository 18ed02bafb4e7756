use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::agenda::{CalendarEvent, EventKind};

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub kind: EventKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Default)]
pub struct EventStore {
    events: RwLock<Vec<CalendarEvent>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chronological by start.
    pub async fn list(&self) -> Vec<CalendarEvent> {
        let mut events = self.events.read().await.clone();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        events
    }

    pub async fn create(&self, new: NewEvent) -> Result<CalendarEvent, AppError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if new.end < new.start {
            return Err(AppError::Validation(
                "event cannot end before it starts".to_string(),
            ));
        }
        let event = CalendarEvent {
            id: Uuid::new_v4(),
            title: title.to_string(),
            kind: new.kind,
            start: new.start,
            end: new.end,
            location: new.location.filter(|l| !l.trim().is_empty()),
            attendees: new.attendees,
            created_at: Utc::now(),
        };
        self.events.write().await.push(event.clone());
        info!(event_id = %event.id, "Calendar event created");
        Ok(event)
    }

    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<(), AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(format!(
                "deleting event {id} requires confirm=true"
            )));
        }
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(AppError::NotFound(format!("Event {id} not found")));
        }
        Ok(())
    }
}

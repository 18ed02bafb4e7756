//! Demo content loaded at startup so every page has something to show.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::agenda::{NewEvent, NewTask};
use crate::errors::AppError;
use crate::flows::NewFlow;
use crate::insights::NewInsight;
use crate::models::agenda::{EventKind, TaskPriority};
use crate::models::connection::IntegrationKind;
use crate::models::conversation::{Conversation, ConversationStatus};
use crate::models::flow::{ActionType, AiSettings, Channel, FlowAction, Trigger, TriggerType};
use crate::models::insight::{Impact, InsightType};
use crate::models::log_entry::{LogEntry, LogLevel};
use crate::models::server::{Server, ServerStatus};
use crate::state::AppState;

fn message(channel: Channel, content: &str, delay_minutes: u32) -> FlowAction {
    FlowAction {
        action_type: match channel {
            Channel::Email => ActionType::SendEmail,
            Channel::Sms => ActionType::SendSms,
            _ => ActionType::SendMessage,
        },
        channel: Some(channel),
        content: Some(content.to_string()),
        delay_minutes: Some(delay_minutes),
        conditions: None,
    }
}

fn demo_flows() -> Vec<NewFlow> {
    vec![
        NewFlow {
            name: "New lead welcome".to_string(),
            description: "Greets inbound leads and books a call".to_string(),
            triggers: vec![Trigger {
                trigger_type: TriggerType::Interaction,
                condition: "lead_created".to_string(),
                value: json!("website"),
            }],
            actions: vec![
                message(Channel::Whatsapp, "Hi! Thanks for reaching out.", 0),
                message(Channel::Email, "Here is our catalogue.", 60),
                FlowAction {
                    action_type: ActionType::CreateTask,
                    channel: None,
                    content: Some("Call the lead".to_string()),
                    delay_minutes: Some(1440),
                    conditions: None,
                },
            ],
            ai_settings: AiSettings {
                enabled: true,
                personalization: true,
                auto_optimize_time: true,
                ..AiSettings::default()
            },
        },
        NewFlow {
            name: "Quote reminder".to_string(),
            description: "Nudges contacts who did not answer a quote".to_string(),
            triggers: vec![Trigger {
                trigger_type: TriggerType::NoResponse,
                condition: "hours".to_string(),
                value: json!(48),
            }],
            actions: vec![
                message(Channel::Sms, "Did you get a chance to look at the quote?", 0),
                FlowAction {
                    action_type: ActionType::AssignTag,
                    channel: None,
                    content: Some("quote-pending".to_string()),
                    delay_minutes: None,
                    conditions: None,
                },
            ],
            ai_settings: AiSettings::default(),
        },
        NewFlow {
            name: "Win-back".to_string(),
            description: "Reactivates customers idle for 90 days".to_string(),
            triggers: vec![Trigger {
                trigger_type: TriggerType::DateBased,
                condition: "days_since_purchase".to_string(),
                value: json!(90),
            }],
            actions: vec![message(Channel::Instagram, "We miss you! 10% off this week.", 0)],
            ai_settings: AiSettings::default(),
        },
    ]
}

fn conversation(
    name: &str,
    channel: Channel,
    last_message: &str,
    minutes_ago: i64,
    unread_count: u32,
    pinned: bool,
) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: Uuid::new_v4(),
        contact_name: name.to_string(),
        channel,
        status: if unread_count > 0 {
            ConversationStatus::Open
        } else {
            ConversationStatus::Resolved
        },
        last_message: last_message.to_string(),
        last_message_at: now - Duration::minutes(minutes_ago),
        unread_count,
        pinned,
        tags: vec![],
        created_at: now - Duration::days(3),
    }
}

fn server(name: &str, region: &str, status: ServerStatus, cpu: f64, memory: f64, disk: f64) -> Server {
    let now = Utc::now();
    Server {
        id: Uuid::new_v4(),
        name: name.to_string(),
        region: region.to_string(),
        status,
        cpu_usage: cpu,
        memory_usage: memory,
        disk_usage: disk,
        uptime_secs: 86_400 * 12,
        last_checked: now,
        created_at: now - Duration::days(30),
    }
}

pub async fn seed_demo_data(state: &AppState) -> Result<(), AppError> {
    let now = Utc::now();

    let mut flow_ids = Vec::new();
    for new in demo_flows() {
        flow_ids.push(state.flows.create(new).await?.id);
    }
    if let [welcome, reminder, ..] = flow_ids[..] {
        state.flows.activate(welcome).await?;
        state.flows.activate(reminder).await?;
        state.flows.pause(reminder).await?;
    }

    for (title, due_in, priority) in [
        ("Send revised proposal", Duration::hours(-20), TaskPriority::High),
        ("Confirm delivery date", Duration::hours(3), TaskPriority::Medium),
        ("Quarterly review prep", Duration::days(12), TaskPriority::Low),
    ] {
        state
            .tasks
            .create(NewTask {
                title: title.to_string(),
                description: String::new(),
                due_date: now + due_in,
                priority,
                linked_conversation: None,
            })
            .await?;
    }

    state
        .events
        .create(NewEvent {
            title: "Onboarding call".to_string(),
            kind: EventKind::Call,
            start: now + Duration::hours(2),
            end: now + Duration::hours(2) + Duration::minutes(30),
            location: None,
            attendees: vec!["ana@example.com".to_string()],
        })
        .await?;

    for c in [
        conversation("Ana Lima", Channel::Whatsapp, "Can we talk tomorrow?", 4, 2, true),
        conversation("Bruno Reis", Channel::Instagram, "Loved the new collection", 35, 1, false),
        conversation("Carla Souza", Channel::Email, "Invoice received, thanks", 240, 0, false),
    ] {
        state.inbox.add(c).await;
    }

    state
        .insights
        .create(NewInsight {
            insight_type: InsightType::Optimization,
            title: "Evening sends convert better".to_string(),
            description: "Messages sent after 18:00 get twice the replies".to_string(),
            impact: Impact::High,
            confidence: 87,
            actionable: true,
            suggested_action: Some("Turn on send-time optimisation for the quote reminder".to_string()),
        })
        .await?;

    for s in [
        server("api-1", "sa-east-1", ServerStatus::Online, 42.0, 61.0, 55.0),
        server("worker-1", "sa-east-1", ServerStatus::Online, 71.0, 68.0, 40.0),
        server("db-1", "us-east-1", ServerStatus::Maintenance, 5.0, 30.0, 82.0),
    ] {
        state.fleet.register(s).await;
    }

    state
        .connections
        .create(IntegrationKind::WhatsappBusiness, "Main WhatsApp")
        .await?;

    state
        .log
        .append(
            LogEntry::new(LogLevel::Warn, "connections", "Webhook retry scheduled")
                .with_details(json!({ "attempt": 2 })),
        )
        .await;

    info!(flows = flow_ids.len(), "Demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::connections::DemoProbe;
    use crate::execution::ScriptedOutcome;
    use crate::logs::LogFilter;
    use crate::models::flow::FlowStatus;

    #[tokio::test]
    async fn test_seed_fills_every_page() {
        let state = AppState::new(
            SimulationConfig::default(),
            Arc::new(ScriptedOutcome::always_succeed()),
            Arc::new(DemoProbe),
        );
        seed_demo_data(&state).await.unwrap();

        let flows = state.flows.list().await;
        assert_eq!(flows.len(), 3);
        let statuses: Vec<FlowStatus> = flows.iter().map(|f| f.status).collect();
        assert_eq!(
            statuses,
            vec![FlowStatus::Active, FlowStatus::Paused, FlowStatus::Draft]
        );
        assert_eq!(state.tasks.all().await.len(), 3);
        assert_eq!(state.events.list().await.len(), 1);
        assert_eq!(state.inbox.all().await.len(), 3);
        assert_eq!(state.insights.list().await.len(), 1);
        assert_eq!(state.fleet.list().await.len(), 3);
        assert_eq!(state.connections.list().await.len(), 1);
        assert!(!state.log.query(&LogFilter::default()).await.is_empty());
    }
}

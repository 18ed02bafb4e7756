//! Derived statistics for every dashboard panel.
//!
//! All functions are pure and recomputed on demand. Rates are averaged
//! per item without weighting by volume: a flow with one execution counts
//! as much as a flow with ten thousand.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::agenda::{CalendarEvent, Task, TaskStatus};
use crate::models::conversation::Conversation;
use crate::models::execution::{ExecutionStatus, FollowUpExecution};
use crate::models::flow::{FlowStatus, FollowUpFlow};
use crate::models::log_entry::{LogEntry, LogLevel};
use crate::models::server::{Server, ServerStatus};
use crate::stats::calendar::{TaskBucket, ViewerClock};

/// Arithmetic mean; 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Flows and executions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FlowStats {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
    pub draft: usize,
    pub total_executions: u64,
    pub avg_success_rate: f64,
    pub avg_conversion_rate: f64,
    pub avg_response_time: f64,
}

pub fn flow_stats(flows: &[FollowUpFlow]) -> FlowStats {
    let count = |status: FlowStatus| flows.iter().filter(|f| f.status == status).count();
    FlowStats {
        total: flows.len(),
        active: count(FlowStatus::Active),
        paused: count(FlowStatus::Paused),
        draft: count(FlowStatus::Draft),
        total_executions: flows.iter().map(|f| f.analytics.total_executions).sum(),
        avg_success_rate: mean(flows.iter().map(|f| f.analytics.success_rate)),
        avg_conversion_rate: mean(flows.iter().map(|f| f.analytics.conversion_rate)),
        avg_response_time: mean(flows.iter().map(|f| f.analytics.avg_response_time)),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExecutionStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

pub fn execution_stats(executions: &[FollowUpExecution]) -> ExecutionStats {
    let mut stats = ExecutionStats {
        total: executions.len(),
        ..ExecutionStats::default()
    };
    for e in executions {
        match e.status {
            ExecutionStatus::Pending => stats.pending += 1,
            ExecutionStatus::Running => stats.running += 1,
            ExecutionStatus::Completed => stats.completed += 1,
            ExecutionStatus::Failed => stats.failed += 1,
            ExecutionStatus::Cancelled => stats.cancelled += 1,
        }
    }
    stats
}

// ────────────────────────────────────────────────────────────────────────────
// Agenda and calendar
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    pub due_this_month: usize,
}

pub fn task_stats(tasks: &[Task], clock: &ViewerClock) -> TaskStats {
    let status = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    let bucket = |b: TaskBucket| tasks.iter().filter(|t| b.contains(t, clock)).count();
    TaskStats {
        total: tasks.len(),
        pending: status(TaskStatus::Pending),
        in_progress: status(TaskStatus::InProgress),
        completed: status(TaskStatus::Completed),
        cancelled: status(TaskStatus::Cancelled),
        overdue: bucket(TaskBucket::Overdue),
        due_today: bucket(TaskBucket::Today),
        due_this_week: bucket(TaskBucket::Week),
        due_this_month: bucket(TaskBucket::Month),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EventStats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub upcoming: usize,
}

pub fn event_stats(events: &[CalendarEvent], clock: &ViewerClock) -> EventStats {
    let count = |pred: &dyn Fn(&CalendarEvent) -> bool| events.iter().filter(|e| pred(*e)).count();
    EventStats {
        total: events.len(),
        today: count(&|e| clock.is_today(&e.start)),
        this_week: count(&|e| clock.is_this_week(&e.start)),
        this_month: count(&|e| clock.is_this_month(&e.start)),
        upcoming: count(&|e| !clock.is_past(&e.start)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inbox, logs, fleet
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ConversationStats {
    pub total: usize,
    pub unread: u64,
    pub pinned: usize,
    pub by_channel: BTreeMap<String, usize>,
}

pub fn conversation_stats(conversations: &[Conversation]) -> ConversationStats {
    let mut by_channel = BTreeMap::new();
    for c in conversations {
        *by_channel
            .entry(format!("{:?}", c.channel).to_lowercase())
            .or_insert(0) += 1;
    }
    ConversationStats {
        total: conversations.len(),
        unread: conversations.iter().map(|c| u64::from(c.unread_count)).sum(),
        pinned: conversations.iter().filter(|c| c.pinned).count(),
        by_channel,
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LogStats {
    pub total: usize,
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    /// Percentage of entries at error level.
    pub error_rate: f64,
    /// Mean over entries that carry a duration.
    pub avg_duration_ms: f64,
    pub by_source: BTreeMap<String, usize>,
}

pub fn log_stats(entries: &[LogEntry]) -> LogStats {
    let level = |l: LogLevel| entries.iter().filter(|e| e.level == l).count();
    let error = level(LogLevel::Error);
    let mut by_source = BTreeMap::new();
    for e in entries {
        *by_source.entry(e.source.clone()).or_insert(0) += 1;
    }
    LogStats {
        total: entries.len(),
        debug: level(LogLevel::Debug),
        info: level(LogLevel::Info),
        warn: level(LogLevel::Warn),
        error,
        error_rate: if entries.is_empty() {
            0.0
        } else {
            error as f64 / entries.len() as f64 * 100.0
        },
        avg_duration_ms: mean(entries.iter().filter_map(|e| e.duration_ms).map(|d| d as f64)),
        by_source,
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FleetStats {
    pub total: usize,
    pub online: usize,
    pub degraded: usize,
    pub maintenance: usize,
    pub offline: usize,
    pub avg_cpu: f64,
    pub avg_memory: f64,
    pub avg_disk: f64,
}

pub fn fleet_stats(servers: &[Server]) -> FleetStats {
    let status = |s: ServerStatus| servers.iter().filter(|srv| srv.status == s).count();
    FleetStats {
        total: servers.len(),
        online: status(ServerStatus::Online),
        degraded: status(ServerStatus::Degraded),
        maintenance: status(ServerStatus::Maintenance),
        offline: status(ServerStatus::Offline),
        avg_cpu: mean(servers.iter().map(|s| s.cpu_usage)),
        avg_memory: mean(servers.iter().map(|s| s.memory_usage)),
        avg_disk: mean(servers.iter().map(|s| s.disk_usage)),
    }
}

//! Activity log book backing the logs page.
//!
//! Flow and execution changes append here; readers filter and export.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::models::log_entry::{LogEntry, LogLevel};

#[derive(Debug, Default)]
pub struct LogBook {
    entries: RwLock<Vec<LogEntry>>,
}

/// All dimensions are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub levels: Option<Vec<LogLevel>>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(levels) = &self.levels {
            if !levels.is_empty() && !levels.contains(&entry.level) {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if !entry.source.eq_ignore_ascii_case(source) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_details = entry
                .details
                .as_ref()
                .map(|d| d.to_string().to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !entry.message.to_lowercase().contains(&needle) && !in_details {
                return false;
            }
        }
        if self.since.is_some_and(|since| entry.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.timestamp > until) {
            return false;
        }
        true
    }
}

pub fn parse_level(raw: &str) -> Option<LogLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, entry: LogEntry) {
        self.entries.write().await.push(entry);
    }

    /// Matching entries, newest first.
    pub async fn query(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let entries = self.entries.read().await;
        let mut matched: Vec<LogEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

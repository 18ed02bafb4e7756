use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Online,
    Degraded,
    Maintenance,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub status: ServerStatus,
    /// Utilisation percentages in [0, 100].
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub uptime_secs: u64,
    pub last_checked: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

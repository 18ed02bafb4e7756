use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::download::JsonDownload;
use crate::errors::AppError;
use crate::logs::{parse_level, LogFilter};
use crate::models::log_entry::LogEntry;
use crate::state::AppState;
use crate::stats::aggregator::{log_stats, LogStats};

/// Query-string form of [`LogFilter`]. `level` is comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub level: Option<String>,
    pub source: Option<String>,
    pub q: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<LogQuery> for LogFilter {
    type Error = AppError;

    fn try_from(query: LogQuery) -> Result<Self, Self::Error> {
        let levels = match query.level.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| {
                        parse_level(part).ok_or_else(|| {
                            AppError::Validation(format!("unknown log level '{}'", part.trim()))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        if let (Some(since), Some(until)) = (query.since, query.until) {
            if since > until {
                return Err(AppError::Validation("since must not be after until".to_string()));
            }
        }
        Ok(LogFilter {
            levels,
            source: query.source.filter(|s| !s.trim().is_empty()),
            search: query.q.filter(|s| !s.trim().is_empty()),
            since: query.since,
            until: query.until,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub entries: Vec<LogEntry>,
    /// Over the filtered entries.
    pub stats: LogStats,
}

/// GET /api/v1/logs?level=warn,error&source=executions&q=timeout
pub async fn handle_list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogListResponse>, AppError> {
    let filter = LogFilter::try_from(query)?;
    let entries = state.log.query(&filter).await;
    let stats = log_stats(&entries);
    Ok(Json(LogListResponse { entries, stats }))
}

/// GET /api/v1/logs/export
///
/// Same filters as the list; downloads `logs-<date>.json`.
pub async fn handle_export_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<JsonDownload, AppError> {
    let filter = LogFilter::try_from(query)?;
    let entries = state.log.query(&filter).await;
    JsonDownload::new("logs", Utc::now().date_naive(), &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::log_entry::LogLevel;

    #[test]
    fn test_comma_separated_levels() {
        let filter = LogFilter::try_from(LogQuery {
            level: Some("warning, error".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.levels, Some(vec![LogLevel::Warn, LogLevel::Error]));
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = LogFilter::try_from(LogQuery {
            level: Some("info,loud".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let now = Utc::now();
        let result = LogFilter::try_from(LogQuery {
            since: Some(now),
            until: Some(now - chrono::Duration::hours(1)),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}

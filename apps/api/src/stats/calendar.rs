//! Calendar-day bucketing in the viewer's UTC offset.

use chrono::{DateTime, Datelike, FixedOffset, Local, Utc};
use serde::Deserialize;

use crate::models::agenda::Task;

/// "Now" as seen by the viewer. Day, week and month boundaries are computed
/// in this offset; overdue compares instants.
#[derive(Debug, Clone, Copy)]
pub struct ViewerClock {
    pub now: DateTime<FixedOffset>,
}

impl ViewerClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Uses `tz_offset_minutes` east of UTC when given and valid, else the
    /// server's local offset.
    pub fn for_offset(tz_offset_minutes: Option<i32>) -> Self {
        let offset = tz_offset_minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| *Local::now().offset());
        Self::new(Utc::now().with_timezone(&offset))
    }

    fn local(&self, at: &DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.now.timezone())
    }

    pub fn is_today(&self, at: &DateTime<Utc>) -> bool {
        self.local(at).date_naive() == self.now.date_naive()
    }

    /// Same ISO week (Monday start).
    pub fn is_this_week(&self, at: &DateTime<Utc>) -> bool {
        self.local(at).iso_week() == self.now.iso_week()
    }

    pub fn is_this_month(&self, at: &DateTime<Utc>) -> bool {
        let local = self.local(at);
        local.year() == self.now.year() && local.month() == self.now.month()
    }

    pub fn is_past(&self, at: &DateTime<Utc>) -> bool {
        *at < self.now
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskBucket {
    Overdue,
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl TaskBucket {
    /// Date buckets only hold open tasks; finished work is never overdue.
    pub fn contains(&self, task: &Task, clock: &ViewerClock) -> bool {
        if *self == TaskBucket::All {
            return true;
        }
        if task.status.is_terminal() {
            return false;
        }
        match self {
            TaskBucket::Overdue => clock.is_past(&task.due_date),
            TaskBucket::Today => clock.is_today(&task.due_date),
            TaskBucket::Week => clock.is_this_week(&task.due_date),
            TaskBucket::Month => clock.is_this_month(&task.due_date),
            TaskBucket::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn clock_at(y: i32, m: u32, d: u32, h: u32, offset_hours: i32) -> ViewerClock {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let now = offset
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap(),
            )
            .unwrap();
        ViewerClock::new(now)
    }

    #[test]
    fn test_today_uses_viewer_offset() {
        // 23:00 on the 10th in UTC-3 is 02:00 on the 11th in UTC.
        let clock = clock_at(2026, 6, 10, 23, -3);
        let same_evening = Utc.with_ymd_and_hms(2026, 6, 11, 2, 30, 0).unwrap();
        let next_local_day = Utc.with_ymd_and_hms(2026, 6, 11, 4, 0, 0).unwrap();
        assert!(clock.is_today(&same_evening));
        assert!(!clock.is_today(&next_local_day));
    }

    #[test]
    fn test_week_starts_monday() {
        // 2026-06-10 is a Wednesday.
        let clock = clock_at(2026, 6, 10, 12, 0);
        assert!(clock.is_this_week(&Utc.with_ymd_and_hms(2026, 6, 8, 0, 0, 0).unwrap()));
        assert!(clock.is_this_week(&Utc.with_ymd_and_hms(2026, 6, 14, 23, 0, 0).unwrap()));
        assert!(!clock.is_this_week(&Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_month_boundary() {
        let clock = clock_at(2026, 6, 30, 12, 0);
        assert!(clock.is_this_month(&Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()));
        assert!(!clock.is_this_month(&Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()));
        assert!(!clock.is_this_month(&Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_invalid_offset_falls_back() {
        let clock = ViewerClock::for_offset(Some(100_000));
        assert_eq!(clock.now.offset(), Local::now().offset());
    }
}

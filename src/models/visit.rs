use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Visit row joined with the gym name
#[derive(Debug, Clone, FromRow)]
pub struct VisitRecord {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub gym_name: String,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitView {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub gym_name: String,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub duration: String,
}

impl VisitView {
    /// Open visits are measured up to `now`
    pub fn from_record(record: VisitRecord, now: DateTime<Utc>) -> Self {
        let minutes = visit_minutes(record.check_in_time, record.check_out_time.unwrap_or(now));
        Self {
            id: record.id,
            gym_id: record.gym_id,
            gym_name: record.gym_name,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            duration_minutes: minutes,
            duration: format_duration(minutes),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of visits to return (default: 10, max: 100)
    pub limit: Option<i64>,
}

impl HistoryQuery {
    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

/// Whole minutes between check-in and check-out, never negative
pub fn visit_minutes(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    (check_out - check_in).num_minutes().max(0)
}

pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(65), "1h 5m");
        assert_eq!(format_duration(120), "2h 0m");
        assert_eq!(format_duration(-3), "0h 0m");
    }

    #[test]
    fn test_visit_minutes_truncates_seconds() {
        let check_in = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let check_out = check_in + Duration::seconds(90 * 60 + 59);
        assert_eq!(visit_minutes(check_in, check_out), 90);
        assert_eq!(visit_minutes(check_out, check_in), 0);
    }

    #[test]
    fn test_open_visit_measured_to_now() {
        let check_in = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let now = check_in + Duration::minutes(75);
        let view = VisitView::from_record(
            VisitRecord {
                id: Uuid::new_v4(),
                gym_id: Uuid::new_v4(),
                gym_name: "Iron Temple".to_string(),
                check_in_time: check_in,
                check_out_time: None,
            },
            now,
        );
        assert_eq!(view.duration_minutes, 75);
        assert_eq!(view.duration, "1h 15m");
    }

    #[test]
    fn test_history_limit() {
        assert_eq!(HistoryQuery { limit: None }.get_limit(), 10);
        assert_eq!(HistoryQuery { limit: Some(500) }.get_limit(), 100);
        assert_eq!(HistoryQuery { limit: Some(0) }.get_limit(), 1);
    }
}

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{AthleteSummary, VisitView};

pub const VISIT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyVisits {
    pub date: NaiveDate,
    pub visits: i64,
}

/// The `days` dates ending today, oldest first
pub fn visit_window(today: NaiveDate, days: i64) -> Vec<NaiveDate> {
    (0..days.max(0))
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// Counts for each day of the window; days without visits read zero
pub fn zero_fill_window(today: NaiveDate, days: i64, counts: &[DailyVisits]) -> Vec<DailyVisits> {
    visit_window(today, days)
        .into_iter()
        .map(|date| DailyVisits {
            date,
            visits: counts
                .iter()
                .filter(|c| c.date == date)
                .map(|c| c.visits)
                .sum(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerLoad {
    pub trainer_id: Uuid,
    pub full_name: String,
    pub athletes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymStatistics {
    pub gym_id: Uuid,
    pub gym_name: String,
    pub members_count: i64,
    pub trainers_count: i64,
    pub avg_rating: f64,
    pub visits_last_7_days: Vec<DailyVisits>,
    pub athletes_per_trainer: Vec<TrainerLoad>,
    pub active_visits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerStatistics {
    pub trainer_id: Uuid,
    pub athletes_count: i64,
    pub avg_rating: f64,
    pub athletes: Vec<AthleteSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteStatistics {
    pub athlete_id: Uuid,
    pub visits_count: i64,
    pub visits_last_7_days: Vec<DailyVisits>,
    pub avg_minutes: i64,
    pub avg_duration: String,
    pub checked_in: bool,
    pub active_visit: Option<VisitView>,
}

/// Averages are reported to two decimal places
pub fn round_rating(average: f64) -> f64 {
    (average * 100.0).round() / 100.0
}

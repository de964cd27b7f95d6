use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{GymError, GymResult};
use crate::models::{
    format_duration, round_rating, zero_fill_window, AthleteStatistics, AthleteSummary,
    DailyVisits, GymStatistics, TrainerLoad, TrainerStatistics, VisitRecord, VisitView,
    VISIT_WINDOW_DAYS,
};
use crate::services::visit_service::VISIT_RECORD_SELECT;

/// Dashboard aggregates for each role
#[derive(Debug, Clone)]
pub struct StatisticsService {
    db: PgPool,
}

/// Midnight UTC of the first day in the window ending `today`
fn window_start(today: NaiveDate) -> DateTime<Utc> {
    (today - Duration::days(VISIT_WINDOW_DAYS - 1))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

impl StatisticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn gym_statistics(&self, gym_id: Uuid) -> GymResult<GymStatistics> {
        let gym_name: String = sqlx::query_scalar("SELECT gym_name FROM gym_details WHERE id = $1")
            .bind(gym_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Gym"))?;

        let members_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM athlete_details WHERE gym_id = $1")
                .bind(gym_id)
                .fetch_one(&self.db)
                .await?;

        let trainers_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM trainer_details WHERE gym_id = $1")
                .bind(gym_id)
                .fetch_one(&self.db)
                .await?;

        let avg_rating: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(rating)::float8, 0) FROM reviews WHERE gym_id = $1",
        )
        .bind(gym_id)
        .fetch_one(&self.db)
        .await?;

        let today = Utc::now().date_naive();
        let daily = sqlx::query_as::<_, DailyVisits>(
            r#"
            SELECT (check_in_time AT TIME ZONE 'UTC')::date AS date, COUNT(*) AS visits
            FROM gym_visits
            WHERE gym_id = $1 AND check_in_time >= $2
            GROUP BY 1
            "#,
        )
        .bind(gym_id)
        .bind(window_start(today))
        .fetch_all(&self.db)
        .await?;

        let athletes_per_trainer = sqlx::query_as::<_, TrainerLoad>(
            r#"
            SELECT t.id AS trainer_id, t.full_name, COUNT(a.id) AS athletes
            FROM trainer_details t
            LEFT JOIN athlete_details a ON a.trainer_id = t.id
            WHERE t.gym_id = $1
            GROUP BY t.id, t.full_name
            ORDER BY t.full_name
            "#,
        )
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        let active_visits: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM gym_visits WHERE gym_id = $1 AND check_out_time IS NULL",
        )
        .bind(gym_id)
        .fetch_one(&self.db)
        .await?;

        Ok(GymStatistics {
            gym_id,
            gym_name,
            members_count,
            trainers_count,
            avg_rating: round_rating(avg_rating),
            visits_last_7_days: zero_fill_window(today, VISIT_WINDOW_DAYS, &daily),
            athletes_per_trainer,
            active_visits,
        })
    }

    pub async fn trainer_statistics(&self, trainer_id: Uuid) -> GymResult<TrainerStatistics> {
        let athletes = self.trainer_athletes(trainer_id).await?;

        let avg_rating: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(rating)::float8, 0) FROM reviews WHERE trainer_id = $1",
        )
        .bind(trainer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(TrainerStatistics {
            trainer_id,
            athletes_count: athletes.len() as i64,
            avg_rating: round_rating(avg_rating),
            athletes,
        })
    }

    /// Athletes assigned to a trainer
    pub async fn trainer_athletes(&self, trainer_id: Uuid) -> GymResult<Vec<AthleteSummary>> {
        let athletes = sqlx::query_as::<_, AthleteSummary>(
            "SELECT id, user_id, full_name, age, gender, goals
             FROM athlete_details WHERE trainer_id = $1
             ORDER BY full_name",
        )
        .bind(trainer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(athletes)
    }

    pub async fn athlete_statistics(&self, athlete_id: Uuid) -> GymResult<AthleteStatistics> {
        let visits_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM gym_visits WHERE athlete_id = $1")
                .bind(athlete_id)
                .fetch_one(&self.db)
                .await?;

        let today = Utc::now().date_naive();
        let daily = sqlx::query_as::<_, DailyVisits>(
            r#"
            SELECT (check_in_time AT TIME ZONE 'UTC')::date AS date, COUNT(*) AS visits
            FROM gym_visits
            WHERE athlete_id = $1 AND check_in_time >= $2
            GROUP BY 1
            "#,
        )
        .bind(athlete_id)
        .bind(window_start(today))
        .fetch_all(&self.db)
        .await?;

        let avg_minutes: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(EXTRACT(EPOCH FROM (check_out_time - check_in_time)) / 60)::float8, 0)
            FROM gym_visits
            WHERE athlete_id = $1 AND check_out_time IS NOT NULL
            "#,
        )
        .bind(athlete_id)
        .fetch_one(&self.db)
        .await?;
        let avg_minutes = avg_minutes.round() as i64;

        let active_visit = sqlx::query_as::<_, VisitRecord>(&format!(
            "{VISIT_RECORD_SELECT} WHERE v.athlete_id = $1 AND v.check_out_time IS NULL
             ORDER BY v.check_in_time DESC LIMIT 1"
        ))
        .bind(athlete_id)
        .fetch_optional(&self.db)
        .await?
        .map(|record| VisitView::from_record(record, Utc::now()));

        Ok(AthleteStatistics {
            athlete_id,
            visits_count,
            visits_last_7_days: zero_fill_window(today, VISIT_WINDOW_DAYS, &daily),
            avg_minutes,
            avg_duration: format_duration(avg_minutes),
            checked_in: active_visit.is_some(),
            active_visit,
        })
    }
}

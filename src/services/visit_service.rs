use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{is_unique_violation, GymError, GymResult};
use crate::models::{AthleteDetails, VisitRecord, VisitView};

pub(crate) const VISIT_RECORD_SELECT: &str = r#"
    SELECT v.id, v.gym_id, g.gym_name, v.check_in_time, v.check_out_time
    FROM gym_visits v
    JOIN gym_details g ON g.id = v.gym_id
"#;

/// Check-in / check-out tracking
#[derive(Debug, Clone)]
pub struct VisitService {
    db: PgPool,
}

impl VisitService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn check_in(&self, athlete: &AthleteDetails) -> GymResult<VisitView> {
        let gym_id = athlete
            .gym_id
            .ok_or_else(|| GymError::validation("choose a gym before checking in"))?;

        let mut tx = self.db.begin().await?;

        let active: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM gym_visits WHERE athlete_id = $1 AND check_out_time IS NULL FOR UPDATE",
        )
        .bind(athlete.id)
        .fetch_optional(&mut *tx)
        .await?;

        if active.is_some() {
            return Err(GymError::conflict("You are already checked in"));
        }

        let visit_id = Uuid::new_v4();
        sqlx::query("INSERT INTO gym_visits (id, athlete_id, gym_id, check_in_time) VALUES ($1, $2, $3, $4)")
            .bind(visit_id)
            .bind(athlete.id)
            .bind(gym_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    warn!(athlete_id = %athlete.id, "concurrent check-in rejected");
                    GymError::conflict("You are already checked in")
                } else {
                    GymError::Database(e)
                }
            })?;

        tx.commit().await?;

        info!(visit_id = %visit_id, athlete_id = %athlete.id, gym_id = %gym_id, "checked in");
        self.get_visit(visit_id).await
    }

    /// Close the athlete's active visit, or a specific one when `visit_id` is given
    pub async fn check_out(&self, athlete_id: Uuid, visit_id: Option<Uuid>) -> GymResult<VisitView> {
        let closed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE gym_visits SET check_out_time = $3
            WHERE athlete_id = $1 AND check_out_time IS NULL AND ($2::uuid IS NULL OR id = $2)
            RETURNING id
            "#,
        )
        .bind(athlete_id)
        .bind(visit_id)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        let visit_id = closed.ok_or(GymError::NotFound("Active visit"))?;

        let visit = self.get_visit(visit_id).await?;
        info!(visit_id = %visit_id, athlete_id = %athlete_id, minutes = visit.duration_minutes, "checked out");
        Ok(visit)
    }

    pub async fn active_visits(&self, athlete_id: Uuid) -> GymResult<Vec<VisitView>> {
        let records = sqlx::query_as::<_, VisitRecord>(&format!(
            "{VISIT_RECORD_SELECT} WHERE v.athlete_id = $1 AND v.check_out_time IS NULL
             ORDER BY v.check_in_time DESC"
        ))
        .bind(athlete_id)
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        Ok(records.into_iter().map(|r| VisitView::from_record(r, now)).collect())
    }

    /// Completed visits, newest first
    pub async fn history(&self, athlete_id: Uuid, limit: i64) -> GymResult<Vec<VisitView>> {
        let records = sqlx::query_as::<_, VisitRecord>(&format!(
            "{VISIT_RECORD_SELECT} WHERE v.athlete_id = $1 AND v.check_out_time IS NOT NULL
             ORDER BY v.check_in_time DESC LIMIT $2"
        ))
        .bind(athlete_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        Ok(records.into_iter().map(|r| VisitView::from_record(r, now)).collect())
    }

    async fn get_visit(&self, visit_id: Uuid) -> GymResult<VisitView> {
        let record = sqlx::query_as::<_, VisitRecord>(&format!("{VISIT_RECORD_SELECT} WHERE v.id = $1"))
            .bind(visit_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Visit"))?;

        Ok(VisitView::from_record(record, Utc::now()))
    }
}

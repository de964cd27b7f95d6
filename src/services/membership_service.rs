use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{is_foreign_key_violation, GymError, GymResult};
use crate::models::{
    membership_end_date, AthleteDetails, Membership, MembershipPlan, MembershipRecord,
    MembershipView, PaymentStatus, SavePlanRequest,
};

const PLAN_COLUMNS: &str = "id, gym_id, plan_name, duration_months, price, description, created_at";

const MEMBERSHIP_SELECT: &str = r#"
    SELECT m.id, m.athlete_id, a.full_name AS athlete_name, m.plan_id, p.plan_name,
           m.start_date, m.end_date, m.payment_status, m.created_at
    FROM memberships m
    JOIN membership_plans p ON p.id = m.plan_id
    JOIN athlete_details a ON a.id = m.athlete_id
"#;

/// Membership plans and athlete subscriptions
#[derive(Debug, Clone)]
pub struct MembershipService {
    db: PgPool,
}

impl MembershipService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_plan(&self, gym_id: Uuid, plan: SavePlanRequest) -> GymResult<MembershipPlan> {
        plan.validate()?;

        let plan = sqlx::query_as::<_, MembershipPlan>(&format!(
            "INSERT INTO membership_plans (id, gym_id, plan_name, duration_months, price, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(gym_id)
        .bind(plan.plan_name.trim())
        .bind(plan.duration_months)
        .bind(plan.price)
        .bind(plan.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
        .fetch_one(&self.db)
        .await?;

        info!(plan_id = %plan.id, gym_id = %gym_id, "membership plan created");
        Ok(plan)
    }

    pub async fn list_plans(&self, gym_id: Uuid) -> GymResult<Vec<MembershipPlan>> {
        let plans = sqlx::query_as::<_, MembershipPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM membership_plans WHERE gym_id = $1
             ORDER BY duration_months, price"
        ))
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(plans)
    }

    pub async fn update_plan(
        &self,
        gym_id: Uuid,
        plan_id: Uuid,
        plan: SavePlanRequest,
    ) -> GymResult<MembershipPlan> {
        plan.validate()?;

        let updated = sqlx::query_as::<_, MembershipPlan>(&format!(
            "UPDATE membership_plans
             SET plan_name = $3, duration_months = $4, price = $5, description = $6
             WHERE id = $1 AND gym_id = $2
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(plan_id)
        .bind(gym_id)
        .bind(plan.plan_name.trim())
        .bind(plan.duration_months)
        .bind(plan.price)
        .bind(plan.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
        .fetch_optional(&self.db)
        .await?
        .ok_or(GymError::NotFound("Membership plan"))?;

        info!(plan_id = %plan_id, "membership plan updated");
        Ok(updated)
    }

    /// Plans with subscriptions cannot be deleted
    pub async fn delete_plan(&self, gym_id: Uuid, plan_id: Uuid) -> GymResult<()> {
        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM memberships WHERE plan_id = $1)")
                .bind(plan_id)
                .fetch_one(&self.db)
                .await?;

        if in_use {
            return Err(GymError::conflict("Plan has memberships and cannot be deleted"));
        }

        let result = sqlx::query("DELETE FROM membership_plans WHERE id = $1 AND gym_id = $2")
            .bind(plan_id)
            .bind(gym_id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    GymError::conflict("Plan has memberships and cannot be deleted")
                } else {
                    GymError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(GymError::NotFound("Membership plan"));
        }

        info!(plan_id = %plan_id, "membership plan deleted");
        Ok(())
    }

    /// Subscribe an athlete to a plan of their gym, starting today
    pub async fn subscribe(&self, athlete: &AthleteDetails, plan_id: Uuid) -> GymResult<MembershipView> {
        let gym_id = athlete
            .gym_id
            .ok_or_else(|| GymError::validation("choose a gym before subscribing"))?;

        let plan = sqlx::query_as::<_, MembershipPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM membership_plans WHERE id = $1 AND gym_id = $2"
        ))
        .bind(plan_id)
        .bind(gym_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GymError::NotFound("Membership plan"))?;

        let start_date = today();
        let end_date = membership_end_date(start_date, plan.duration_months)
            .ok_or_else(|| GymError::validation("plan duration is out of range"))?;

        let mut tx = self.db.begin().await?;

        let membership = sqlx::query_as::<_, Membership>(
            "INSERT INTO memberships (id, athlete_id, plan_id, start_date, end_date, payment_status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, athlete_id, plan_id, start_date, end_date, payment_status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(athlete.id)
        .bind(plan.id)
        .bind(start_date)
        .bind(end_date)
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users
             SET membership_expiry_date = GREATEST(COALESCE(membership_expiry_date, $2), $2),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(athlete.user_id)
        .bind(membership.end_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            membership_id = %membership.id,
            athlete_id = %athlete.id,
            plan_id = %plan.id,
            end_date = %membership.end_date,
            "membership created"
        );

        self.get_membership(membership.id).await
    }

    pub async fn list_athlete_memberships(&self, athlete_id: Uuid) -> GymResult<Vec<MembershipView>> {
        let records = sqlx::query_as::<_, MembershipRecord>(&format!(
            "{MEMBERSHIP_SELECT} WHERE m.athlete_id = $1 ORDER BY m.start_date DESC, m.created_at DESC"
        ))
        .bind(athlete_id)
        .fetch_all(&self.db)
        .await?;

        Ok(to_views(records))
    }

    pub async fn list_gym_memberships(&self, gym_id: Uuid) -> GymResult<Vec<MembershipView>> {
        let records = sqlx::query_as::<_, MembershipRecord>(&format!(
            "{MEMBERSHIP_SELECT} WHERE p.gym_id = $1 ORDER BY m.created_at DESC"
        ))
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(to_views(records))
    }

    pub async fn update_payment_status(
        &self,
        gym_id: Uuid,
        membership_id: Uuid,
        status: PaymentStatus,
    ) -> GymResult<MembershipView> {
        let result = sqlx::query(
            "UPDATE memberships m SET payment_status = $3
             FROM membership_plans p
             WHERE p.id = m.plan_id AND m.id = $1 AND p.gym_id = $2",
        )
        .bind(membership_id)
        .bind(gym_id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::NotFound("Membership"));
        }

        info!(membership_id = %membership_id, status = status.as_str(), "payment status updated");
        self.get_membership(membership_id).await
    }

    async fn get_membership(&self, membership_id: Uuid) -> GymResult<MembershipView> {
        let record = sqlx::query_as::<_, MembershipRecord>(&format!("{MEMBERSHIP_SELECT} WHERE m.id = $1"))
            .bind(membership_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Membership"))?;

        Ok(MembershipView::from_record(record, today()))
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn to_views(records: Vec<MembershipRecord>) -> Vec<MembershipView> {
    let today = today();
    records
        .into_iter()
        .map(|record| MembershipView::from_record(record, today))
        .collect()
}

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::service::{insert_user, NewUser};
use crate::auth::UserRole;
use crate::error::{GymError, GymResult};
use crate::models::{AffiliatedTrainer, GymMember, RegisterMemberRequest};
use crate::services::profile_service::mark_profile_complete;

const AFFILIATED_TRAINER_SELECT: &str = r#"
    SELECT t.id, t.user_id, u.username, t.full_name, t.specialization, t.experience,
           t.certification_verified, u.trainer_approved, u.trainer_approval_date,
           (SELECT COUNT(*) FROM athlete_details a WHERE a.trainer_id = t.id) AS athletes_count
    FROM trainer_details t
    JOIN users u ON u.id = t.user_id
"#;

const GYM_MEMBER_SELECT: &str = r#"
    SELECT a.id, a.user_id, u.username, a.full_name, a.age, a.gender, a.goals,
           t.full_name AS trainer_name, u.membership_expiry_date, u.manually_registered
    FROM athlete_details a
    JOIN users u ON u.id = a.user_id
    LEFT JOIN trainer_details t ON t.id = a.trainer_id
"#;

/// Gym manager oversight of trainers and members
#[derive(Debug, Clone)]
pub struct StaffService {
    db: PgPool,
}

impl StaffService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_affiliated_trainers(&self, gym_id: Uuid) -> GymResult<Vec<AffiliatedTrainer>> {
        let trainers = sqlx::query_as::<_, AffiliatedTrainer>(&format!(
            "{AFFILIATED_TRAINER_SELECT} WHERE t.gym_id = $1 ORDER BY u.trainer_approved, t.full_name"
        ))
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(trainers)
    }

    /// Approve or revoke a trainer affiliated with the manager's gym
    pub async fn set_trainer_approval(
        &self,
        gym_id: Uuid,
        trainer_id: Uuid,
        approved: bool,
    ) -> GymResult<AffiliatedTrainer> {
        let result = sqlx::query(
            r#"
            UPDATE users u
            SET trainer_approved = $3,
                trainer_approval_date = CASE WHEN $3 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            FROM trainer_details t
            WHERE t.user_id = u.id AND t.id = $1 AND t.gym_id = $2
            "#,
        )
        .bind(trainer_id)
        .bind(gym_id)
        .bind(approved)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::NotFound("Trainer"));
        }

        info!(trainer_id = %trainer_id, gym_id = %gym_id, approved, "trainer approval updated");

        sqlx::query_as::<_, AffiliatedTrainer>(&format!("{AFFILIATED_TRAINER_SELECT} WHERE t.id = $1"))
            .bind(trainer_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Trainer"))
    }

    pub async fn list_members(&self, gym_id: Uuid) -> GymResult<Vec<GymMember>> {
        let members = sqlx::query_as::<_, GymMember>(&format!(
            "{GYM_MEMBER_SELECT} WHERE a.gym_id = $1 ORDER BY a.full_name"
        ))
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(members)
    }

    /// Create an athlete account and profile attached to the manager's gym
    pub async fn register_member(&self, gym_id: Uuid, request: RegisterMemberRequest) -> GymResult<GymMember> {
        request.validate()?;

        let mut tx = self.db.begin().await?;

        let user = insert_user(
            &mut tx,
            NewUser {
                username: &request.username,
                display_name: &request.full_name,
                password: &request.password,
                role: UserRole::Athlete,
                manually_registered: true,
            },
        )
        .await?;

        let athlete_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO athlete_details (id, user_id, full_name, age, gender, weight, height, goals,
                                         medical_conditions, gym_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(athlete_id)
        .bind(user.id)
        .bind(request.full_name.trim())
        .bind(request.age)
        .bind(request.gender.as_str())
        .bind(request.weight)
        .bind(request.height)
        .bind(request.goals.trim())
        .bind(
            request
                .medical_conditions
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        )
        .bind(gym_id)
        .execute(&mut *tx)
        .await?;

        mark_profile_complete(&mut tx, user.id).await?;
        tx.commit().await?;

        info!(user_id = %user.id, gym_id = %gym_id, "member registered manually");

        sqlx::query_as::<_, GymMember>(&format!("{GYM_MEMBER_SELECT} WHERE a.id = $1"))
            .bind(athlete_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Member"))
    }
}

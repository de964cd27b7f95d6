use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::{GymError, GymResult};
use crate::models::{
    AthleteDetails, AthleteProfile, GymDetails, GymListing, SaveAthleteDetails, SaveGymDetails,
    SaveTrainerDetails, TrainerDetails, TrainerListing, TrainerProfile,
};

pub(crate) const ATHLETE_PROFILE_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.full_name, a.age, a.gender, a.weight, a.height, a.goals,
           a.medical_conditions, a.gym_id, g.gym_name, a.trainer_id,
           t.full_name AS trainer_name, u.membership_expiry_date
    FROM athlete_details a
    JOIN users u ON u.id = a.user_id
    LEFT JOIN gym_details g ON g.id = a.gym_id
    LEFT JOIN trainer_details t ON t.id = a.trainer_id
"#;

const TRAINER_PROFILE_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.full_name, t.certification_verified, t.specialization,
           t.experience, t.gym_id, g.gym_name, u.trainer_approved, u.trainer_approval_date
    FROM trainer_details t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN gym_details g ON g.id = t.gym_id
"#;

/// Role profiles, the gym/trainer directory and user-to-profile lookups
#[derive(Debug, Clone)]
pub struct ProfileService {
    db: PgPool,
    auto_verify_documents: bool,
}

impl ProfileService {
    pub fn new(db: PgPool, auto_verify_documents: bool) -> Self {
        Self {
            db,
            auto_verify_documents,
        }
    }

    pub async fn save_gym_details(&self, user_id: Uuid, details: SaveGymDetails) -> GymResult<GymDetails> {
        details.validate()?;

        let mut tx = self.db.begin().await?;

        let gym = sqlx::query_as::<_, GymDetails>(
            r#"
            INSERT INTO gym_details (id, user_id, gym_name, license_verified, address, contact_number, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET gym_name = EXCLUDED.gym_name,
                license_verified = gym_details.license_verified OR EXCLUDED.license_verified,
                address = EXCLUDED.address,
                contact_number = EXCLUDED.contact_number,
                email = EXCLUDED.email
            RETURNING id, user_id, gym_name, license_verified, address, contact_number, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(details.gym_name.trim())
        .bind(self.auto_verify_documents)
        .bind(details.address.trim())
        .bind(details.contact_number.trim())
        .bind(details.email.trim())
        .fetch_one(&mut *tx)
        .await?;

        mark_profile_complete(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, gym_id = %gym.id, "gym details saved");
        Ok(gym)
    }

    pub async fn get_gym_details(&self, user_id: Uuid) -> GymResult<GymDetails> {
        sqlx::query_as::<_, GymDetails>(
            "SELECT id, user_id, gym_name, license_verified, address, contact_number, email
             FROM gym_details WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GymError::NotFound("Gym profile"))
    }

    pub async fn save_trainer_details(
        &self,
        user_id: Uuid,
        details: SaveTrainerDetails,
    ) -> GymResult<TrainerProfile> {
        details.validate()?;

        if let Some(gym_id) = details.gym_id {
            self.ensure_gym_exists(gym_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let previous: Option<TrainerDetails> = sqlx::query_as(
            "SELECT id, user_id, full_name, certification_verified, specialization, experience, gym_id
             FROM trainer_details WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let trainer_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO trainer_details (id, user_id, full_name, certification_verified, specialization, experience, gym_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                certification_verified = trainer_details.certification_verified OR EXCLUDED.certification_verified,
                specialization = EXCLUDED.specialization,
                experience = EXCLUDED.experience,
                gym_id = EXCLUDED.gym_id
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(details.full_name.trim())
        .bind(self.auto_verify_documents)
        .bind(details.specialization.trim())
        .bind(details.experience)
        .bind(details.gym_id)
        .fetch_one(&mut *tx)
        .await?;

        let gym_changed = previous
            .as_ref()
            .is_some_and(|prev| prev.gym_id != details.gym_id);

        if gym_changed {
            // A new gym means a new manager has to approve
            sqlx::query(
                "UPDATE users SET trainer_approved = false, trainer_approval_date = NULL, updated_at = NOW()
                 WHERE id = $1 AND trainer_approval_required",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            let released = sqlx::query(
                "UPDATE athlete_details SET trainer_id = NULL
                 WHERE trainer_id = $1 AND gym_id IS DISTINCT FROM $2",
            )
            .bind(trainer_id)
            .bind(details.gym_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            info!(trainer_id = %trainer_id, released, "trainer changed gym");
        }

        mark_profile_complete(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, trainer_id = %trainer_id, "trainer details saved");
        self.get_trainer_details(user_id).await
    }

    pub async fn get_trainer_details(&self, user_id: Uuid) -> GymResult<TrainerProfile> {
        sqlx::query_as::<_, TrainerProfile>(&format!("{TRAINER_PROFILE_SELECT} WHERE t.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Trainer profile"))
    }

    pub async fn save_athlete_details(
        &self,
        user_id: Uuid,
        details: SaveAthleteDetails,
    ) -> GymResult<AthleteProfile> {
        details.validate()?;

        if let Some(gym_id) = details.gym_id {
            self.ensure_gym_exists(gym_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let previous: Option<AthleteDetails> = sqlx::query_as(
            "SELECT id, user_id, full_name, age, gender, weight, height, goals, medical_conditions, gym_id, trainer_id
             FROM athlete_details WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        // An omitted trainer is kept only while the gym stays the same
        let trainer_id = match details.trainer_id {
            Some(trainer_id) => Some(trainer_id),
            None => previous
                .as_ref()
                .filter(|prev| prev.gym_id == details.gym_id)
                .and_then(|prev| prev.trainer_id),
        };

        if let (Some(trainer_id), Some(gym_id)) = (trainer_id, details.gym_id) {
            ensure_trainer_available(&mut tx, trainer_id, gym_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO athlete_details (id, user_id, full_name, age, gender, weight, height, goals,
                                         medical_conditions, gym_id, trainer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                weight = EXCLUDED.weight,
                height = EXCLUDED.height,
                goals = EXCLUDED.goals,
                medical_conditions = EXCLUDED.medical_conditions,
                gym_id = EXCLUDED.gym_id,
                trainer_id = EXCLUDED.trainer_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(details.full_name.trim())
        .bind(details.age)
        .bind(details.gender.as_str())
        .bind(details.weight)
        .bind(details.height)
        .bind(details.goals.trim())
        .bind(
            details
                .medical_conditions
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        )
        .bind(details.gym_id)
        .bind(trainer_id)
        .execute(&mut *tx)
        .await?;

        mark_profile_complete(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, "athlete details saved");
        self.get_athlete_details(user_id).await
    }

    pub async fn get_athlete_details(&self, user_id: Uuid) -> GymResult<AthleteProfile> {
        sqlx::query_as::<_, AthleteProfile>(&format!("{ATHLETE_PROFILE_SELECT} WHERE a.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Athlete profile"))
    }

    /// Athlete profile as seen by the trainer it is assigned to
    pub async fn get_assigned_athlete(&self, trainer_id: Uuid, athlete_id: Uuid) -> GymResult<AthleteProfile> {
        sqlx::query_as::<_, AthleteProfile>(&format!(
            "{ATHLETE_PROFILE_SELECT} WHERE a.id = $1 AND a.trainer_id = $2"
        ))
        .bind(athlete_id)
        .bind(trainer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GymError::NotFound("Athlete"))
    }

    /// Set or clear the athlete's trainer
    pub async fn select_trainer(&self, user_id: Uuid, trainer_id: Option<Uuid>) -> GymResult<AthleteProfile> {
        let athlete = self.athlete_for(user_id).await?;

        let mut tx = self.db.begin().await?;

        if let Some(trainer_id) = trainer_id {
            let gym_id = athlete
                .gym_id
                .ok_or_else(|| GymError::validation("choose a gym before choosing a trainer"))?;
            ensure_trainer_available(&mut tx, trainer_id, gym_id).await?;
        }

        sqlx::query("UPDATE athlete_details SET trainer_id = $1 WHERE id = $2")
            .bind(trainer_id)
            .bind(athlete.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(athlete_id = %athlete.id, trainer_id = ?trainer_id, "athlete trainer updated");
        self.get_athlete_details(user_id).await
    }

    pub async fn list_gyms(&self) -> GymResult<Vec<GymListing>> {
        let gyms = sqlx::query_as::<_, GymListing>(
            "SELECT id, gym_name, address FROM gym_details ORDER BY gym_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(gyms)
    }

    /// Approved trainers affiliated with a gym
    pub async fn list_trainers_by_gym(&self, gym_id: Uuid) -> GymResult<Vec<TrainerListing>> {
        self.ensure_gym_exists(gym_id).await?;

        let trainers = sqlx::query_as::<_, TrainerListing>(
            r#"
            SELECT t.id, t.full_name, t.specialization, t.experience
            FROM trainer_details t
            JOIN users u ON u.id = t.user_id
            WHERE t.gym_id = $1 AND (u.trainer_approved OR NOT u.trainer_approval_required)
            ORDER BY t.full_name
            "#,
        )
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(trainers)
    }

    pub async fn ensure_gym_exists(&self, gym_id: Uuid) -> GymResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM gym_details WHERE id = $1)")
            .bind(gym_id)
            .fetch_one(&self.db)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(GymError::NotFound("Gym"))
        }
    }

    pub async fn ensure_trainer_exists(&self, trainer_id: Uuid) -> GymResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trainer_details WHERE id = $1)")
                .bind(trainer_id)
                .fetch_one(&self.db)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(GymError::NotFound("Trainer"))
        }
    }

    /// Gym owned by a manager
    pub async fn gym_id_for(&self, user_id: Uuid) -> GymResult<Uuid> {
        sqlx::query_scalar("SELECT id FROM gym_details WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::ProfileIncomplete("gym"))
    }

    pub async fn trainer_id_for(&self, user_id: Uuid) -> GymResult<Uuid> {
        sqlx::query_scalar("SELECT id FROM trainer_details WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::ProfileIncomplete("trainer"))
    }

    pub async fn athlete_for(&self, user_id: Uuid) -> GymResult<AthleteDetails> {
        sqlx::query_as::<_, AthleteDetails>(
            "SELECT id, user_id, full_name, age, gender, weight, height, goals, medical_conditions, gym_id, trainer_id
             FROM athlete_details WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GymError::ProfileIncomplete("athlete"))
    }
}

pub(crate) async fn mark_profile_complete(conn: &mut PgConnection, user_id: Uuid) -> GymResult<()> {
    sqlx::query("UPDATE users SET profile_complete = true, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// The trainer must work at `gym_id` and be cleared to take athletes
async fn ensure_trainer_available(conn: &mut PgConnection, trainer_id: Uuid, gym_id: Uuid) -> GymResult<()> {
    let row: Option<(Option<Uuid>, bool)> = sqlx::query_as(
        r#"
        SELECT t.gym_id, (u.trainer_approved OR NOT u.trainer_approval_required) AS approved
        FROM trainer_details t
        JOIN users u ON u.id = t.user_id
        WHERE t.id = $1
        "#,
    )
    .bind(trainer_id)
    .fetch_optional(conn)
    .await?;

    match row {
        None => Err(GymError::NotFound("Trainer")),
        Some((trainer_gym, _)) if trainer_gym != Some(gym_id) => Err(GymError::validation(
            "trainer does not belong to the selected gym",
        )),
        Some((_, false)) => Err(GymError::validation("trainer is not yet approved by the gym")),
        Some(_) => Ok(()),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub certification_verified: bool,
    pub specialization: String,
    pub experience: i32,
    pub gym_id: Option<Uuid>,
}

/// Trainer details joined with gym name and approval state
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub certification_verified: bool,
    pub specialization: String,
    pub experience: i32,
    pub gym_id: Option<Uuid>,
    pub gym_name: Option<String>,
    pub trainer_approved: bool,
    pub trainer_approval_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveTrainerDetails {
    pub full_name: String,
    pub specialization: String,
    pub experience: i32,
    pub gym_id: Option<Uuid>,
}

impl SaveTrainerDetails {
    pub fn validate(&self) -> Result<(), GymError> {
        if self.full_name.trim().is_empty() {
            return Err(GymError::validation("full_name is required"));
        }
        if self.specialization.trim().is_empty() {
            return Err(GymError::validation("specialization is required"));
        }
        if !(0..=80).contains(&self.experience) {
            return Err(GymError::validation("experience must be between 0 and 80 years"));
        }
        Ok(())
    }
}

/// Public directory entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerListing {
    pub id: Uuid,
    pub full_name: String,
    pub specialization: String,
    pub experience: i32,
}

/// Trainer as seen by the manager of their gym
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AffiliatedTrainer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub specialization: String,
    pub experience: i32,
    pub certification_verified: bool,
    pub trainer_approved: bool,
    pub trainer_approval_date: Option<DateTime<Utc>>,
    pub athletes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut request = SaveTrainerDetails {
            full_name: "Kim Lee".to_string(),
            specialization: "Strength".to_string(),
            experience: 0,
            gym_id: None,
        };
        assert!(request.validate().is_ok());

        request.experience = -1;
        assert!(request.validate().is_err());

        request.experience = 4;
        request.specialization = String::new();
        assert!(request.validate().is_err());
    }
}

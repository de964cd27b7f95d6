use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AthleteDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: f64,
    pub goals: String,
    pub medical_conditions: Option<String>,
    pub gym_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
}

/// Athlete details with the names of their gym and trainer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AthleteProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: f64,
    pub goals: String,
    pub medical_conditions: Option<String>,
    pub gym_id: Option<Uuid>,
    pub gym_name: Option<String>,
    pub trainer_id: Option<Uuid>,
    pub trainer_name: Option<String>,
    pub membership_expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveAthleteDetails {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub weight: f64,
    pub height: f64,
    pub goals: String,
    pub medical_conditions: Option<String>,
    pub gym_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
}

impl SaveAthleteDetails {
    pub fn validate(&self) -> Result<(), GymError> {
        validate_body(&self.full_name, self.age, self.weight, self.height, &self.goals)?;

        if self.trainer_id.is_some() && self.gym_id.is_none() {
            return Err(GymError::validation("choose a gym before choosing a trainer"));
        }

        Ok(())
    }
}

fn validate_body(full_name: &str, age: i32, weight: f64, height: f64, goals: &str) -> Result<(), GymError> {
    if full_name.trim().is_empty() {
        return Err(GymError::validation("full_name is required"));
    }
    if !(1..=100).contains(&age) {
        return Err(GymError::validation("age must be between 1 and 100"));
    }
    if !(weight > 0.0 && weight <= 300.0) {
        return Err(GymError::validation("weight must be between 0 and 300 kg"));
    }
    if !(height > 0.0 && height <= 300.0) {
        return Err(GymError::validation("height must be between 0 and 300 cm"));
    }
    if goals.trim().is_empty() {
        return Err(GymError::validation("goals are required"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectTrainerRequest {
    pub trainer_id: Option<Uuid>,
}

/// Athlete card shown on trainer dashboards
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AthleteSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub goals: String,
}

/// Gym member as listed for the manager
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub goals: String,
    pub trainer_name: Option<String>,
    pub membership_expiry_date: Option<NaiveDate>,
    pub manually_registered: bool,
}

/// Member registered at the front desk by a gym manager
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterMemberRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub weight: f64,
    pub height: f64,
    pub goals: String,
    pub medical_conditions: Option<String>,
}

impl RegisterMemberRequest {
    pub fn validate(&self) -> Result<(), GymError> {
        validate_body(&self.full_name, self.age, self.weight, self.height, &self.goals)
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{5,30}$").expect("valid phone regex"));

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gym_name: String,
    pub license_verified: bool,
    pub address: String,
    pub contact_number: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveGymDetails {
    pub gym_name: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
}

impl SaveGymDetails {
    pub fn validate(&self) -> Result<(), GymError> {
        for (field, value) in [
            ("gym_name", &self.gym_name),
            ("address", &self.address),
            ("contact_number", &self.contact_number),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(GymError::validation(format!("{field} is required")));
            }
        }

        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(GymError::validation("email is not a valid address"));
        }

        if !PHONE_RE.is_match(self.contact_number.trim()) {
            return Err(GymError::validation("contact_number is not a valid phone number"));
        }

        Ok(())
    }
}

/// Directory entry for the gym picker
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymListing {
    pub id: Uuid,
    pub gym_name: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> SaveGymDetails {
        SaveGymDetails {
            gym_name: "Iron Temple".to_string(),
            address: "12 Main St".to_string(),
            contact_number: "+1 (555) 010-2030".to_string(),
            email: "front@irontemple.test".to_string(),
        }
    }

    #[test]
    fn test_valid_details() {
        assert!(details().validate().is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut request = details();
        request.address = "   ".to_string();
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "address is required");
    }

    #[test]
    fn test_email_and_phone_format() {
        let mut request = details();
        request.email = "not-an-email".to_string();
        assert!(request.validate().is_err());

        let mut request = details();
        request.contact_number = "call me".to_string();
        assert!(request.validate().is_err());
    }
}

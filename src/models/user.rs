use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::{UserInfo, UserRole};

pub const USER_COLUMNS: &str = "id, username, display_name, password_hash, role, profile_complete, \
     trainer_approval_required, trainer_approved, trainer_approval_date, \
     membership_expiry_date, manually_registered, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub profile_complete: bool,
    pub trainer_approval_required: bool,
    pub trainer_approved: bool,
    pub trainer_approval_date: Option<DateTime<Utc>>,
    pub membership_expiry_date: Option<NaiveDate>,
    pub manually_registered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn user_role(&self) -> Option<UserRole> {
        UserRole::from_str(&self.role)
    }

    /// A trainer that still needs a gym manager's sign-off
    pub fn is_pending_approval(&self) -> bool {
        self.trainer_approval_required && !self.trainer_approved
    }

    pub fn to_info(&self, role: UserRole) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role,
            profile_complete: self.profile_complete,
            trainer_approval_required: self.trainer_approval_required,
            trainer_approved: self.trainer_approved,
            membership_expiry_date: self.membership_expiry_date,
            manually_registered: self.manually_registered,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles for role-based access control
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    GymManager,
    Trainer,
    Athlete,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::GymManager => "gym_manager",
            UserRole::Trainer => "trainer",
            UserRole::Athlete => "athlete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "gym_manager" => Some(UserRole::GymManager),
            "trainer" => Some(UserRole::Trainer),
            "athlete" => Some(UserRole::Athlete),
            _ => None,
        }
    }

    /// Human readable label used in contact lists and ticket responses
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::GymManager => "Gym Manager",
            UserRole::Trainer => "Trainer",
            UserRole::Athlete => "Athlete",
        }
    }

    /// Trainers must be approved by a gym manager before using their workspace
    pub fn requires_approval(&self) -> bool {
        matches!(self, UserRole::Trainer)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of a token pair a JWT is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (user ID)
    pub username: String,
    pub role: UserRole,
    pub token_type: TokenType,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,      // JWT ID (for revocation)
}

/// Authentication request models
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
    pub display_name: Option<String>,
}

/// Authentication response models
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub trainer_approval_pending: bool,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    pub profile_complete: bool,
    pub trainer_approval_required: bool,
    pub trainer_approved: bool,
    pub membership_expiry_date: Option<chrono::NaiveDate>,
    pub manually_registered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameAvailability {
    pub username: String,
    pub available: bool,
    pub suggestions: Vec<String>,
}

/// User session information
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub jti: String,
    pub exp: usize,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            username: claims.username.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
            exp: claims.exp,
        })
    }
}

/// Rate limiting models
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
    /// Key clients by `x-forwarded-for` / `x-real-ip`; only safe behind a proxy that sets them
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window_seconds: 300,
            trust_forwarded_headers: false,
        }
    }
}

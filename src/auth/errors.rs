use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Username is already taken")]
    UsernameTaken { suggestions: Vec<String> },
    #[error("Username must be 3-32 characters of letters, digits, '_' or '.'")]
    InvalidUsername,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Trainer account is awaiting approval from a gym manager")]
    PendingApproval,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(#[from] crate::auth::password::PasswordError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UsernameTaken { .. } => StatusCode::CONFLICT,
            AuthError::InvalidUsername => StatusCode::BAD_REQUEST,
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::MissingAuthHeader => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAuthHeaderFormat => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::PendingApproval => StatusCode::FORBIDDEN,
            AuthError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AuthError::PasswordValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashing(e) if e.is_policy_violation() => StatusCode::BAD_REQUEST,
            AuthError::PasswordHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserNotFound => "user_not_found",
            AuthError::UsernameTaken { .. } => "username_taken",
            AuthError::InvalidUsername | AuthError::InvalidRequest(_) => "validation_error",
            AuthError::InvalidToken | AuthError::Jwt(_) => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeaderFormat => "unauthorized",
            AuthError::InsufficientPermissions => "forbidden",
            AuthError::PendingApproval => "pending_approval",
            AuthError::RateLimitExceeded => "rate_limited",
            AuthError::PasswordValidation(_) => "validation_error",
            AuthError::PasswordHashing(e) if e.is_policy_violation() => "validation_error",
            AuthError::Database(_) | AuthError::PasswordHashing(_) | AuthError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures are logged in full and reported generically
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": self.kind(),
            "message": message,
        });

        if let AuthError::UsernameTaken { suggestions } = &self {
            body["suggestions"] = json!(suggestions);
        }

        (status, Json(body)).into_response()
    }
}

//! Domain error type shared by services and HTTP handlers.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::AuthError;

pub type GymResult<T> = Result<T, GymError>;

#[derive(Error, Debug)]
pub enum GymError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Complete your {0} profile first")]
    ProfileIncomplete(&'static str),
    #[error("Username is already taken")]
    UsernameTaken { suggestions: Vec<String> },
    #[error(transparent)]
    Auth(AuthError),
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl GymError {
    pub fn validation(message: impl Into<String>) -> Self {
        GymError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        GymError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        GymError::Forbidden(message.into())
    }
}

impl From<AuthError> for GymError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UsernameTaken { suggestions } => GymError::UsernameTaken { suggestions },
            AuthError::PasswordHashing(e) => GymError::Password(e),
            AuthError::Database(e) => GymError::Database(e),
            other => GymError::Auth(other),
        }
    }
}

impl From<JsonRejection> for GymError {
    fn from(rejection: JsonRejection) -> Self {
        GymError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GymError {
    fn from(rejection: QueryRejection) -> Self {
        GymError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for GymError {
    fn from(rejection: PathRejection) -> Self {
        GymError::Validation(rejection.body_text())
    }
}

impl IntoResponse for GymError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            GymError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GymError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            GymError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            GymError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            GymError::ProfileIncomplete(_) => (StatusCode::CONFLICT, "profile_incomplete"),
            GymError::UsernameTaken { .. } => (StatusCode::CONFLICT, "username_taken"),
            GymError::Password(e) if e.is_policy_violation() => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            GymError::Auth(_)
            | GymError::Password(_)
            | GymError::Database(_)
            | GymError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if let GymError::Auth(auth) = self {
            return auth.into_response();
        }

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({ "error": kind, "message": message });
        if let GymError::UsernameTaken { suggestions } = &self {
            body["suggestions"] = json!(suggestions);
        }

        (status, Json(body)).into_response()
    }
}

/// Postgres unique_violation (SQLSTATE 23505)
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Postgres foreign_key_violation (SQLSTATE 23503)
pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GymError::NotFound("Visit").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GymError::conflict("already checked in").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GymError::validation("rating must be between 1 and 5").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GymError::ProfileIncomplete("athlete").into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_errors_keep_their_status() {
        let response = GymError::from(AuthError::PendingApproval).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = GymError::from(AuthError::InvalidToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_conversion_unwraps_domain_variants() {
        let error = GymError::from(AuthError::UsernameTaken {
            suggestions: vec!["alex7".to_string()],
        });
        assert!(matches!(error, GymError::UsernameTaken { ref suggestions } if suggestions.len() == 1));
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);

        let error = GymError::from(AuthError::PasswordHashing(PasswordError::NoNumber));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_messages() {
        assert_eq!(GymError::NotFound("Ticket").to_string(), "Ticket not found");
        assert_eq!(
            GymError::ProfileIncomplete("gym").to_string(),
            "Complete your gym profile first"
        );
    }
}

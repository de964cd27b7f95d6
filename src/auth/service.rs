use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::username::{is_valid_username, suggest_usernames};
use crate::auth::{
    AuthError, AuthResponse, ChangePasswordRequest, JwtService, LoginRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, TokenResponse, TokenType, UserInfo, UserRole, UserSession,
    UsernameAvailability, UsernameQuery,
};
use crate::error::is_unique_violation;
use crate::models::{User, USER_COLUMNS};

const SUGGESTION_ROUNDS: usize = 5;

/// Fields for creating a user row
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
    pub role: UserRole,
    pub manually_registered: bool,
}

/// Insert a user on an existing connection so callers can wrap it in a transaction
pub async fn insert_user(conn: &mut PgConnection, new_user: NewUser<'_>) -> Result<User, AuthError> {
    if !is_valid_username(new_user.username) {
        return Err(AuthError::InvalidUsername);
    }
    if new_user.display_name.trim().is_empty() {
        return Err(AuthError::InvalidRequest("display_name is required".to_string()));
    }

    let password_hash = hash_password(new_user.password)?;
    let approval_required = new_user.role.requires_approval();

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, username, display_name, password_hash, role,
                            trainer_approval_required, manually_registered)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new_user.username)
    .bind(new_user.display_name.trim())
    .bind(&password_hash)
    .bind(new_user.role.as_str())
    .bind(approval_required)
    .bind(new_user.manually_registered)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::UsernameTaken { suggestions: Vec::new() }
        } else {
            AuthError::Database(e)
        }
    })?;

    Ok(user)
}

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
        }
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        if !is_valid_username(&request.username) {
            return Err(AuthError::InvalidUsername);
        }

        if self.is_username_taken(&request.username).await? {
            let suggestions = self
                .available_suggestions(&request.display_name, &request.username)
                .await?;
            return Err(AuthError::UsernameTaken { suggestions });
        }

        let mut conn = self.db.acquire().await?;
        let user = match insert_user(
            &mut conn,
            NewUser {
                username: &request.username,
                display_name: &request.display_name,
                password: &request.password,
                role: request.role,
                manually_registered: false,
            },
        )
        .await
        {
            // Lost a race with a concurrent registration of the same name
            Err(AuthError::UsernameTaken { .. }) => {
                let suggestions = self
                    .available_suggestions(&request.display_name, &request.username)
                    .await?;
                return Err(AuthError::UsernameTaken { suggestions });
            }
            other => other?,
        };

        tracing::info!(user_id = %user.id, role = %request.role, "user registered");

        self.issue_tokens(&user, request.role).await
    }

    /// Report whether a username is free, with alternatives when it is not
    pub async fn username_availability(&self, query: UsernameQuery) -> Result<UsernameAvailability, AuthError> {
        if !is_valid_username(&query.username) {
            return Err(AuthError::InvalidUsername);
        }

        let available = !self.is_username_taken(&query.username).await?;
        let suggestions = if available {
            Vec::new()
        } else {
            let display_name = query.display_name.unwrap_or_default();
            self.available_suggestions(&display_name, &query.username).await?
        };

        Ok(UsernameAvailability {
            username: query.username,
            available,
            suggestions,
        })
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .get_user_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        // The role picked at login has to match the account's role
        let role = user.user_role().ok_or(AuthError::InvalidCredentials)?;
        if role != request.role {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, role = %role, "user logged in");

        self.issue_tokens(&user, role).await
    }

    /// Refresh access token
    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> Result<TokenResponse, AuthError> {
        let claims = self
            .jwt_service
            .validate_token_of_type(&request.refresh_token, TokenType::Refresh)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        if !self.is_refresh_token_valid(user_id, &request.refresh_token).await? {
            return Err(AuthError::InvalidToken);
        }

        let access_token = self
            .jwt_service
            .create_access_token(user_id, &claims.username, claims.role)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Logout user (blacklist token)
    pub async fn logout(&self, session: &UserSession) -> Result<MessageResponse, AuthError> {
        self.blacklist_token(&session.jti, session.exp as i64).await?;
        self.revoke_user_refresh_tokens(session.user_id).await?;

        tracing::info!(user_id = %session.user_id, "user logged out");

        Ok(MessageResponse {
            message: "Successfully logged out".to_string(),
        })
    }

    /// Current user record
    pub async fn current_user(&self, session: &UserSession) -> Result<UserInfo, AuthError> {
        let user = self
            .get_user(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.to_info(session.role))
    }

    /// Change password after verifying the current one
    pub async fn change_password(
        &self,
        session: &UserSession,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let user = self
            .get_user(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if request.current_password == request.new_password {
            return Err(AuthError::PasswordValidation(
                "New password must differ from the current password".to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password)?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&self.db)
            .await?;

        self.revoke_user_refresh_tokens(user.id).await?;

        tracing::info!(user_id = %user.id, "password changed");

        Ok(MessageResponse {
            message: "Password changed successfully".to_string(),
        })
    }

    /// Check if token is blacklisted
    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW()")
            .bind(jti)
            .fetch_optional(&self.db)
            .await?;

        Ok(result.is_some())
    }

    /// Validate user session from token
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        if self.is_token_blacklisted(&session.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        Ok(session)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// Remove expired blacklist entries and dead refresh tokens
    pub async fn purge_expired_tokens(&self) -> Result<(u64, u64), AuthError> {
        let blacklist = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?
            .rows_affected();

        let refresh = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW() OR revoked")
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok((blacklist, refresh))
    }

    // Private helper methods

    async fn issue_tokens(&self, user: &User, role: UserRole) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) = self
            .jwt_service
            .create_token_pair(user.id, &user.username, role)?;

        self.store_refresh_token(user.id, &refresh_token).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            trainer_approval_pending: user.is_pending_approval(),
            user: user.to_info(role),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn is_username_taken(&self, username: &str) -> Result<bool, AuthError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(taken)
    }

    async fn available_suggestions(&self, display_name: &str, base: &str) -> Result<Vec<String>, AuthError> {
        let mut accepted: Vec<String> = Vec::with_capacity(3);

        for _ in 0..SUGGESTION_ROUNDS {
            let candidates = {
                let mut rng = rand::thread_rng();
                suggest_usernames(&mut rng, display_name, base)
            };

            let taken: Vec<String> =
                sqlx::query_scalar("SELECT username FROM users WHERE username = ANY($1)")
                    .bind(&candidates)
                    .fetch_all(&self.db)
                    .await?;

            for candidate in candidates {
                if accepted.len() == 3 {
                    break;
                }
                if is_valid_username(&candidate)
                    && !taken.contains(&candidate)
                    && !accepted.contains(&candidate)
                {
                    accepted.push(candidate);
                }
            }

            if accepted.len() == 3 {
                break;
            }
        }

        Ok(accepted)
    }

    async fn store_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.jwt_service.validate_token(refresh_token)?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
            .ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5)"
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(format!("{:x}", md5::compute(refresh_token)))
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn is_refresh_token_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool, AuthError> {
        let token_hash = format!("{:x}", md5::compute(refresh_token));

        let result = sqlx::query(
            "SELECT 1 FROM refresh_tokens
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW() AND NOT revoked"
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(result.is_some())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> Result<(), AuthError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn blacklist_token(&self, jti: &str, exp: i64) -> Result<(), AuthError> {
        let expires_at = chrono::DateTime::from_timestamp(exp, 0)
            .ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING"
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

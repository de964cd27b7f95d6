use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use axum_extra::extract::WithRejection;

use crate::auth::{
    jwt_auth_middleware, rate_limit_middleware, AuthError, AuthResponse, AuthService,
    ChangePasswordRequest, LoginRequest, MessageResponse, RateLimiter, RefreshTokenRequest,
    RegisterRequest, TokenResponse, UserInfo, UserSession, UsernameAvailability, UsernameQuery,
};
use crate::error::GymError;

/// Authentication routes
pub fn auth_routes(auth_service: AuthService, rate_limiter: RateLimiter) -> Router {
    let limited = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/username-available", get(username_available))
        .route("/refresh", post(refresh_token))
        .merge(limited)
        .merge(protected)
        .with_state(auth_service)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, GymError>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let response = auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, GymError>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Check whether a username is free
#[tracing::instrument(skip(auth_service))]
async fn username_available(
    State(auth_service): State<AuthService>,
    WithRejection(Query(query), _): WithRejection<Query<UsernameQuery>, GymError>,
) -> Result<Json<UsernameAvailability>, AuthError> {
    let response = auth_service.username_availability(query).await?;
    Ok(Json(response))
}

/// Refresh access token
#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): WithRejection<Json<RefreshTokenRequest>, GymError>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.refresh_token(request).await?;
    Ok(Json(response))
}

/// Logout user
#[tracing::instrument(skip(auth_service, session), fields(user_id = %session.user_id))]
async fn logout(
    State(auth_service): State<AuthService>,
    session: UserSession,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.logout(&session).await?;
    Ok(Json(response))
}

/// Current user record
#[tracing::instrument(skip(auth_service, session), fields(user_id = %session.user_id))]
async fn me(
    State(auth_service): State<AuthService>,
    session: UserSession,
) -> Result<Json<UserInfo>, AuthError> {
    let user = auth_service.current_user(&session).await?;
    Ok(Json(user))
}

/// Change user password
#[tracing::instrument(skip(auth_service, session, request), fields(user_id = %session.user_id))]
async fn change_password(
    State(auth_service): State<AuthService>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<ChangePasswordRequest>, GymError>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.change_password(&session, request).await?;
    Ok(Json(response))
}

use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::error::GymError;
use crate::models::{GymListing, MembershipPlan, ReviewsResponse, TrainerListing};

/// Gym and trainer directory, open to every signed-in role
pub fn directory_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/gyms", get(list_gyms))
        .route("/api/gyms/:gym_id/trainers", get(list_gym_trainers))
        .route("/api/gyms/:gym_id/plans", get(list_gym_plans))
        .route("/api/gyms/:gym_id/reviews", get(gym_reviews))
        .route("/api/trainers/:trainer_id/reviews", get(trainer_reviews))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[tracing::instrument(skip(state, _session))]
async fn list_gyms(
    State(state): State<AppState>,
    _session: UserSession,
) -> Result<Json<Vec<GymListing>>, GymError> {
    Ok(Json(state.profiles.list_gyms().await?))
}

#[tracing::instrument(skip(state, _session))]
async fn list_gym_trainers(
    State(state): State<AppState>,
    _session: UserSession,
    WithRejection(Path(gym_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<Vec<TrainerListing>>, GymError> {
    Ok(Json(state.profiles.list_trainers_by_gym(gym_id).await?))
}

#[tracing::instrument(skip(state, _session))]
async fn list_gym_plans(
    State(state): State<AppState>,
    _session: UserSession,
    WithRejection(Path(gym_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<Vec<MembershipPlan>>, GymError> {
    state.profiles.ensure_gym_exists(gym_id).await?;
    Ok(Json(state.memberships.list_plans(gym_id).await?))
}

#[tracing::instrument(skip(state, _session))]
async fn gym_reviews(
    State(state): State<AppState>,
    _session: UserSession,
    WithRejection(Path(gym_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<ReviewsResponse>, GymError> {
    state.profiles.ensure_gym_exists(gym_id).await?;
    Ok(Json(state.reviews.gym_reviews(gym_id).await?))
}

#[tracing::instrument(skip(state, _session))]
async fn trainer_reviews(
    State(state): State<AppState>,
    _session: UserSession,
    WithRejection(Path(trainer_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<ReviewsResponse>, GymError> {
    state.profiles.ensure_trainer_exists(trainer_id).await?;
    Ok(Json(state.reviews.trainer_reviews(trainer_id).await?))
}

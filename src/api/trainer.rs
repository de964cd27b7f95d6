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
use crate::auth::{approved_trainer_middleware, jwt_auth_middleware, trainer_only_middleware, UserSession};
use crate::error::GymError;
use crate::models::{
    AthleteProfile, AthleteSummary, ReviewsResponse, SaveTrainerDetails, TrainerProfile,
    TrainerStatistics,
};

/// Trainer workspace; everything but the profile waits for manager approval
pub fn trainer_routes(state: AppState) -> Router {
    let approved = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/athletes", get(list_athletes))
        .route("/athletes/:athlete_id", get(athlete_detail))
        .route("/reviews", get(my_reviews))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            approved_trainer_middleware,
        ));

    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .merge(approved)
        .route_layer(middleware::from_fn(trainer_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn get_profile(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<TrainerProfile>, GymError> {
    Ok(Json(state.profiles.get_trainer_details(session.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn save_profile(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SaveTrainerDetails>, GymError>,
) -> Result<Json<TrainerProfile>, GymError> {
    Ok(Json(state.profiles.save_trainer_details(session.user_id, request).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn dashboard(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<TrainerStatistics>, GymError> {
    let trainer_id = state.profiles.trainer_id_for(session.user_id).await?;
    Ok(Json(state.statistics.trainer_statistics(trainer_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_athletes(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<AthleteSummary>>, GymError> {
    let trainer_id = state.profiles.trainer_id_for(session.user_id).await?;
    Ok(Json(state.statistics.trainer_athletes(trainer_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, athlete_id = %athlete_id))]
async fn athlete_detail(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(athlete_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<AthleteProfile>, GymError> {
    let trainer_id = state.profiles.trainer_id_for(session.user_id).await?;
    Ok(Json(state.profiles.get_assigned_athlete(trainer_id, athlete_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn my_reviews(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<ReviewsResponse>, GymError> {
    let trainer_id = state.profiles.trainer_id_for(session.user_id).await?;
    Ok(Json(state.reviews.trainer_reviews(trainer_id).await?))
}

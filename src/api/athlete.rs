use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use crate::auth::{athlete_only_middleware, jwt_auth_middleware, UserSession};
use crate::error::GymError;
use crate::models::{
    AthleteProfile, AthleteStatistics, CreateReviewRequest, CreateTicketRequest, HistoryQuery,
    MembershipPlan, MembershipView, Review, SaveAthleteDetails, SelectTrainerRequest,
    SubscribeRequest, TicketDetail, TicketQuery, TicketReplyRequest, TicketSummary, VisitView,
};
use crate::services::TicketViewer;

/// Athlete workspace
pub fn athlete_routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/trainer", put(select_trainer))
        .route("/dashboard", get(dashboard))
        .route("/visits/check-in", post(check_in))
        .route("/visits/check-out", post(check_out_current))
        .route("/visits/:visit_id/check-out", post(check_out_visit))
        .route("/visits/active", get(active_visits))
        .route("/visits/history", get(visit_history))
        .route("/reviews", post(add_review))
        .route("/plans", get(gym_plans))
        .route("/memberships", get(my_memberships).post(subscribe))
        .route("/tickets", get(my_tickets).post(create_ticket))
        .route("/tickets/:ticket_id", get(ticket_detail))
        .route("/tickets/:ticket_id/responses", post(add_ticket_information))
        .route_layer(middleware::from_fn(athlete_only_middleware))
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
) -> Result<Json<AthleteProfile>, GymError> {
    Ok(Json(state.profiles.get_athlete_details(session.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn save_profile(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SaveAthleteDetails>, GymError>,
) -> Result<Json<AthleteProfile>, GymError> {
    Ok(Json(state.profiles.save_athlete_details(session.user_id, request).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn select_trainer(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SelectTrainerRequest>, GymError>,
) -> Result<Json<AthleteProfile>, GymError> {
    let profile = state
        .profiles
        .select_trainer(session.user_id, request.trainer_id)
        .await?;
    Ok(Json(profile))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn dashboard(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<AthleteStatistics>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.statistics.athlete_statistics(athlete.id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn check_in(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<(StatusCode, Json<VisitView>), GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let visit = state.visits.check_in(&athlete).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn check_out_current(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<VisitView>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.visits.check_out(athlete.id, None).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, visit_id = %visit_id))]
async fn check_out_visit(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(visit_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<VisitView>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.visits.check_out(athlete.id, Some(visit_id)).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn active_visits(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<VisitView>>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.visits.active_visits(athlete.id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn visit_history(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Query(query), _): WithRejection<Query<HistoryQuery>, GymError>,
) -> Result<Json<Vec<VisitView>>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.visits.history(athlete.id, query.get_limit()).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn add_review(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<CreateReviewRequest>, GymError>,
) -> Result<(StatusCode, Json<Review>), GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let review = state.reviews.add_review(&athlete, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn gym_plans(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<MembershipPlan>>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let plans = match athlete.gym_id {
        Some(gym_id) => state.memberships.list_plans(gym_id).await?,
        None => Vec::new(),
    };
    Ok(Json(plans))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn my_memberships(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<MembershipView>>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    Ok(Json(state.memberships.list_athlete_memberships(athlete.id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn subscribe(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SubscribeRequest>, GymError>,
) -> Result<(StatusCode, Json<MembershipView>), GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let membership = state.memberships.subscribe(&athlete, request.plan_id).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn my_tickets(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Query(query), _): WithRejection<Query<TicketQuery>, GymError>,
) -> Result<Json<Vec<TicketSummary>>, GymError> {
    let status = query.status_filter()?;
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let tickets = state
        .support
        .list_tickets(TicketViewer::Athlete { athlete_id: athlete.id }, status)
        .await?;
    Ok(Json(tickets))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn create_ticket(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<CreateTicketRequest>, GymError>,
) -> Result<(StatusCode, Json<TicketSummary>), GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let ticket = state.support.create_ticket(&athlete, request).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, ticket_id = %ticket_id))]
async fn ticket_detail(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(ticket_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<TicketDetail>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let detail = state
        .support
        .ticket_detail(TicketViewer::Athlete { athlete_id: athlete.id }, ticket_id)
        .await?;
    Ok(Json(detail))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, ticket_id = %ticket_id))]
async fn add_ticket_information(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(ticket_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<TicketReplyRequest>, GymError>,
) -> Result<Json<TicketDetail>, GymError> {
    let athlete = state.profiles.athlete_for(session.user_id).await?;
    let detail = state
        .support
        .respond(
            TicketViewer::Athlete { athlete_id: athlete.id },
            session.user_id,
            ticket_id,
            request,
        )
        .await?;
    Ok(Json(detail))
}

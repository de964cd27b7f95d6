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
use crate::auth::{gym_manager_only_middleware, jwt_auth_middleware, MessageResponse, UserSession};
use crate::error::{GymError, GymResult};
use crate::models::{
    AffiliatedTrainer, GymDetails, GymMember, GymStatistics, MembershipPlan, MembershipView,
    RegisterMemberRequest, ReviewsResponse, SaveGymDetails, SavePlanRequest, TicketDetail,
    TicketQuery, TicketReplyRequest, TicketSummary, UpdatePaymentRequest,
    UpdateTicketStatusRequest,
};
use crate::services::TicketViewer;

/// Gym manager workspace
pub fn manager_routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/dashboard", get(dashboard))
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:plan_id", put(update_plan).delete(delete_plan))
        .route("/memberships", get(list_memberships))
        .route("/memberships/:membership_id/payment", put(update_payment))
        .route("/reviews", get(gym_reviews))
        .route("/trainers", get(list_trainers))
        .route("/trainers/:trainer_id/approve", post(approve_trainer))
        .route("/trainers/:trainer_id/revoke", post(revoke_trainer))
        .route("/members", get(list_members).post(register_member))
        .route("/tickets", get(list_tickets))
        .route("/tickets/:ticket_id", get(ticket_detail))
        .route("/tickets/:ticket_id/responses", post(respond_to_ticket))
        .route("/tickets/:ticket_id/status", put(update_ticket_status))
        .route_layer(middleware::from_fn(gym_manager_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn my_gym(state: &AppState, session: &UserSession) -> GymResult<Uuid> {
    state.profiles.gym_id_for(session.user_id).await
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn get_profile(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<GymDetails>, GymError> {
    Ok(Json(state.profiles.get_gym_details(session.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn save_profile(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SaveGymDetails>, GymError>,
) -> Result<Json<GymDetails>, GymError> {
    Ok(Json(state.profiles.save_gym_details(session.user_id, request).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn dashboard(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<GymStatistics>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.statistics.gym_statistics(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_plans(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<MembershipPlan>>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.memberships.list_plans(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn create_plan(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<SavePlanRequest>, GymError>,
) -> Result<(StatusCode, Json<MembershipPlan>), GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let plan = state.memberships.create_plan(gym_id, request).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, plan_id = %plan_id))]
async fn update_plan(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(plan_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<SavePlanRequest>, GymError>,
) -> Result<Json<MembershipPlan>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.memberships.update_plan(gym_id, plan_id, request).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, plan_id = %plan_id))]
async fn delete_plan(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(plan_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<MessageResponse>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    state.memberships.delete_plan(gym_id, plan_id).await?;
    Ok(Json(MessageResponse {
        message: "Membership plan deleted".to_string(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_memberships(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<MembershipView>>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.memberships.list_gym_memberships(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, membership_id = %membership_id))]
async fn update_payment(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(membership_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdatePaymentRequest>, GymError>,
) -> Result<Json<MembershipView>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let membership = state
        .memberships
        .update_payment_status(gym_id, membership_id, request.payment_status)
        .await?;
    Ok(Json(membership))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn gym_reviews(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<ReviewsResponse>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.reviews.gym_reviews(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_trainers(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<AffiliatedTrainer>>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.staff.list_affiliated_trainers(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, trainer_id = %trainer_id))]
async fn approve_trainer(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(trainer_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<AffiliatedTrainer>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.staff.set_trainer_approval(gym_id, trainer_id, true).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, trainer_id = %trainer_id))]
async fn revoke_trainer(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(trainer_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<AffiliatedTrainer>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.staff.set_trainer_approval(gym_id, trainer_id, false).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_members(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<GymMember>>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    Ok(Json(state.staff.list_members(gym_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn register_member(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Json(request), _): WithRejection<Json<RegisterMemberRequest>, GymError>,
) -> Result<(StatusCode, Json<GymMember>), GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let member = state.staff.register_member(gym_id, request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn list_tickets(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Query(query), _): WithRejection<Query<TicketQuery>, GymError>,
) -> Result<Json<Vec<TicketSummary>>, GymError> {
    let status = query.status_filter()?;
    let gym_id = my_gym(&state, &session).await?;
    let tickets = state
        .support
        .list_tickets(TicketViewer::Manager { gym_id }, status)
        .await?;
    Ok(Json(tickets))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, ticket_id = %ticket_id))]
async fn ticket_detail(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(ticket_id), _): WithRejection<Path<Uuid>, GymError>,
) -> Result<Json<TicketDetail>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let detail = state
        .support
        .ticket_detail(TicketViewer::Manager { gym_id }, ticket_id)
        .await?;
    Ok(Json(detail))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, ticket_id = %ticket_id))]
async fn respond_to_ticket(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(ticket_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<TicketReplyRequest>, GymError>,
) -> Result<Json<TicketDetail>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let detail = state
        .support
        .respond(TicketViewer::Manager { gym_id }, session.user_id, ticket_id, request)
        .await?;
    Ok(Json(detail))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, ticket_id = %ticket_id))]
async fn update_ticket_status(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(ticket_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateTicketStatusRequest>, GymError>,
) -> Result<Json<TicketSummary>, GymError> {
    let gym_id = my_gym(&state, &session).await?;
    let ticket = state
        .support
        .update_status(gym_id, ticket_id, request.status)
        .await?;
    Ok(Json(ticket))
}

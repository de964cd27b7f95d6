use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
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
use crate::models::{
    ChatMessage, Contact, ConversationQuery, Recipient, SendMessageRequest, UnreadCount,
};

/// Direct messages between any two users
pub fn message_routes(state: AppState) -> Router {
    Router::new()
        .route("/contacts", get(contacts))
        .route("/recipients", get(recipients))
        .route("/unread", get(unread_count))
        .route("/:user_id", get(conversation).post(send_message))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn contacts(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<Contact>>, GymError> {
    Ok(Json(state.chat.contacts(session.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn recipients(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<Recipient>>, GymError> {
    Ok(Json(state.chat.recipients(session.user_id, session.role).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn unread_count(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<UnreadCount>, GymError> {
    Ok(Json(state.chat.unread_count(session.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, other_id = %other_id))]
async fn conversation(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(other_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Query(query), _): WithRejection<Query<ConversationQuery>, GymError>,
) -> Result<Json<Vec<ChatMessage>>, GymError> {
    let messages = state
        .chat
        .conversation(session.user_id, other_id, query.get_limit())
        .await?;
    Ok(Json(messages))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, other_id = %other_id))]
async fn send_message(
    State(state): State<AppState>,
    session: UserSession,
    WithRejection(Path(other_id), _): WithRejection<Path<Uuid>, GymError>,
    WithRejection(Json(request), _): WithRejection<Json<SendMessageRequest>, GymError>,
) -> Result<(StatusCode, Json<ChatMessage>), GymError> {
    let message = state
        .chat
        .send_message(session.user_id, other_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

use axum::Router;
use sqlx::PgPool;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use super::{
    athlete::athlete_routes, auth::auth_routes, directory::directory_routes, health::health_routes,
    manager::manager_routes, messages::message_routes, trainer::trainer_routes,
};
use crate::auth::{cors_layer, security_headers_layer, AuthService, RateLimiter};
use crate::config::AppConfig;
use crate::services::{
    ChatService, MembershipService, ProfileService, ReviewService, StaffService,
    StatisticsService, SupportService, VisitService,
};

/// Services shared by every role workspace
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub profiles: ProfileService,
    pub staff: StaffService,
    pub memberships: MembershipService,
    pub visits: VisitService,
    pub reviews: ReviewService,
    pub chat: ChatService,
    pub support: SupportService,
    pub statistics: StatisticsService,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        Self {
            auth_service: AuthService::new(db.clone(), &config.jwt_secret),
            profiles: ProfileService::new(db.clone(), config.auto_verify_documents),
            staff: StaffService::new(db.clone()),
            memberships: MembershipService::new(db.clone()),
            visits: VisitService::new(db.clone()),
            reviews: ReviewService::new(db.clone()),
            chat: ChatService::new(db.clone()),
            support: SupportService::new(db.clone()),
            statistics: StatisticsService::new(db),
        }
    }
}

pub fn create_routes(db: PgPool, config: &AppConfig) -> Router {
    let state = AppState::new(db.clone(), config);
    let rate_limiter = RateLimiter::new(
        config.auth_rate_limit.max_requests as usize,
        Duration::from_secs(config.auth_rate_limit.window_seconds),
    )
    .trust_forwarded_headers(config.auth_rate_limit.trust_forwarded_headers);

    Router::new()
        .merge(health_routes(db))
        .nest("/api/auth", auth_routes(state.auth_service.clone(), rate_limiter))
        .merge(directory_routes(state.clone()))
        .nest("/api/manager", manager_routes(state.clone()))
        .nest("/api/trainer", trainer_routes(state.clone()))
        .nest("/api/athlete", athlete_routes(state.clone()))
        .nest("/api/messages", message_routes(state))
        .layer(security_headers_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

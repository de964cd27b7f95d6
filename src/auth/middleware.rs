use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};

/// JWT authentication middleware
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;

    let session = auth_service.validate_session(token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: UserRole) -> Result<(), AuthError> {
    let session = request
        .extensions()
        .get::<UserSession>()
        .ok_or(AuthError::InsufficientPermissions)?;

    if session.role != role {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(())
}

/// Gym manager only middleware
pub async fn gym_manager_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(&request, UserRole::GymManager)?;
    Ok(next.run(request).await)
}

/// Trainer only middleware
pub async fn trainer_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(&request, UserRole::Trainer)?;
    Ok(next.run(request).await)
}

/// Athlete only middleware
pub async fn athlete_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(&request, UserRole::Athlete)?;
    Ok(next.run(request).await)
}

/// Trainers awaiting approval may only manage their own profile
pub async fn approved_trainer_middleware(
    State(auth_service): State<AuthService>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = request
        .extensions()
        .get::<UserSession>()
        .map(|session| session.user_id)
        .ok_or(AuthError::InsufficientPermissions)?;

    let user = auth_service
        .get_user(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if user.is_pending_approval() {
        return Err(AuthError::PendingApproval);
    }

    Ok(next.run(request).await)
}

/// Extractor for the session placed in request extensions by [`jwt_auth_middleware`]
#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserSession>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// CORS configuration
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<axum::http::HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        axum::http::HeaderValue::from_static("nosniff"),
    )
}

/// Sliding-window rate limiter keyed by client address
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trust_forwarded_headers: bool,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
            trust_forwarded_headers: false,
        }
    }

    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        // A poisoned lock only means another request panicked mid-update
        match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut requests = self.lock();
        let now = Instant::now();

        // Only clients seen within the window stay tracked
        if !requests.contains_key(key) {
            evict_idle(&mut requests, now, self.window);
        }

        let entry = requests.entry(key.to_string()).or_default();

        entry.retain(|&time| now.duration_since(time) < self.window);

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drop clients with no requests inside the window; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let mut requests = self.lock();
        evict_idle(&mut requests, Instant::now(), self.window)
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn client_key(&self, request: &Request) -> String {
        if self.trust_forwarded_headers {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .or_else(|| request.headers().get("x-real-ip"))
                .and_then(|header| header.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty());

            if let Some(client) = forwarded {
                return client.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn evict_idle(requests: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) -> usize {
    let before = requests.len();
    requests.retain(|_, times| {
        times.retain(|&time| now.duration_since(time) < window);
        !times.is_empty()
    });
    before - requests.len()
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let client = rate_limiter.client_key(&request);

    if !rate_limiter.check_rate_limit(&client) {
        tracing::warn!(client = %client, "auth rate limit exceeded");
        return Err(AuthError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

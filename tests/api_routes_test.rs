//! Router behaviour that does not reach the database.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use common::{send, test_config, unreachable_pool, TEST_JWT_SECRET};
use gym_manager::api::create_routes;
use gym_manager::auth::{JwtService, RateLimitConfig, UserRole};
use uuid::Uuid;

fn app() -> axum::Router {
    common::app(unreachable_pool())
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "gym-manager");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_readiness_reports_unavailable_database() {
    let (status, body) = send(&app(), Method::GET, "/health/ready", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_workspaces_require_a_token() {
    let app = app();

    for uri in [
        "/api/auth/me",
        "/api/manager/dashboard",
        "/api/trainer/profile",
        "/api/athlete/visits/history",
        "/api/messages/contacts",
        "/api/gyms",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized", "{uri}");
    }
}

#[tokio::test]
async fn test_malformed_tokens_are_rejected() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/athlete/dashboard",
        Some("not.a.jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_open_a_session() {
    let jwt = JwtService::new(TEST_JWT_SECRET);
    let (access_token, refresh_token) = jwt
        .create_token_pair(Uuid::new_v4(), "kim_lee", UserRole::Athlete)
        .unwrap();
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&refresh_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/athlete/dashboard",
        Some(&refresh_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": access_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_login_rejects_malformed_json() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_unknown_role() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "kim", "password": "Secret123", "role": "owner" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "no spaces allowed",
            "display_name": "Kim",
            "password": "Secret123",
            "role": "athlete"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_username_availability_rejects_invalid_username() {
    let (status, _) = send(
        &app(),
        Method::GET,
        "/api/auth/username-available?username=ab",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_endpoints_are_rate_limited() {
    let config = gym_manager::config::AppConfig {
        auth_rate_limit: RateLimitConfig {
            max_requests: 2,
            window_seconds: 60,
            ..RateLimitConfig::default()
        },
        ..test_config()
    };
    let app = create_routes(unreachable_pool(), &config);
    let body = json!({ "username": "kim" });

    for _ in 0..2 {
        let (status, _) =
            send(&app, Method::POST, "/api/auth/login", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn test_rotating_forwarded_header_does_not_bypass_rate_limit() {
    let config = gym_manager::config::AppConfig {
        auth_rate_limit: RateLimitConfig {
            max_requests: 2,
            window_seconds: 60,
            trust_forwarded_headers: false,
        },
        ..test_config()
    };
    let app = create_routes(unreachable_pool(), &config);

    let mut statuses = Vec::new();
    for octet in 1..=3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", format!("198.51.100.{octet}"))
            .body(Body::from(json!({ "username": "kim" }).to_string()))
            .unwrap();
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(&app(), Method::GET, "/api/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

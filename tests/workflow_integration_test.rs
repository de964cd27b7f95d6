//! End-to-end flows across the three workspaces against a real database.

mod common;

use axum::{http::Method, http::StatusCode, Router};
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

use common::{get, post, put, send, test_database, unique_username, TEST_JWT_SECRET};
use gym_manager::auth::AuthService;

const PASSWORD: &str = "Training2024";

struct Account {
    token: String,
    body: Value,
}

async fn register(app: &Router, username: &str, role: &str) -> Account {
    let display_name: String = Name().fake();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "display_name": display_name,
            "password": PASSWORD,
            "role": role
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register {role}: {body}");
    Account {
        token: body["access_token"].as_str().unwrap().to_string(),
        body,
    }
}

async fn login(app: &Router, username: &str, role: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD, "role": role })),
    )
    .await
}

/// Manager with a saved gym profile; returns (token, gym id)
async fn manager_with_gym(app: &Router) -> (String, String) {
    let manager = register(app, &unique_username("mgr"), "gym_manager").await;
    let gym_name: String = CompanyName().fake();

    let (status, gym) = put(
        app,
        "/api/manager/profile",
        &manager.token,
        json!({
            "gym_name": gym_name,
            "address": "12 Harbour Road",
            "contact_number": "+1 555 0100",
            "email": "front.desk@example.com"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{gym}");

    (manager.token, gym["id"].as_str().unwrap().to_string())
}

/// Trainer affiliated with `gym_id`; returns (token, trainer id)
async fn trainer_at(app: &Router, gym_id: &str, full_name: &str) -> (String, String) {
    let trainer = register(app, &unique_username("coach"), "trainer").await;
    assert_eq!(trainer.body["trainer_approval_pending"], true);

    let (status, profile) = put(
        app,
        "/api/trainer/profile",
        &trainer.token,
        json!({
            "full_name": full_name,
            "specialization": "Strength",
            "experience": 6,
            "gym_id": gym_id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{profile}");
    assert_eq!(profile["trainer_approved"], false);

    (trainer.token, profile["id"].as_str().unwrap().to_string())
}

async fn athlete_at(app: &Router, gym_id: &str, trainer_id: Option<&str>) -> (String, Value) {
    let athlete = register(app, &unique_username("ath"), "athlete").await;
    let full_name: String = Name().fake();

    let (status, profile) = put(
        app,
        "/api/athlete/profile",
        &athlete.token,
        json!({
            "full_name": full_name,
            "age": 29,
            "gender": "Female",
            "weight": 61.5,
            "height": 168.0,
            "goals": "Run a half marathon",
            "gym_id": gym_id,
            "trainer_id": trainer_id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{profile}");

    (athlete.token, profile)
}

#[tokio::test]
#[serial]
async fn test_registration_and_login() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let username = unique_username("kim");
    let account = register(&app, &username, "athlete").await;
    assert_eq!(account.body["user"]["role"], "athlete");
    assert_eq!(account.body["user"]["profile_complete"], false);
    assert_eq!(account.body["trainer_approval_pending"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "display_name": "Kim Lee",
            "password": PASSWORD,
            "role": "athlete"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username_taken");
    assert!(!body["suggestions"].as_array().unwrap().is_empty());

    let (status, availability) = send(
        &app,
        Method::GET,
        &format!("/api/auth/username-available?username={username}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available"], false);

    let (status, _) = login(&app, &username, "athlete").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&app, &username, "trainer").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, me) = get(&app, "/api/auth/me", &account.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], username.as_str());
}

#[tokio::test]
#[serial]
async fn test_taken_long_username_gets_three_suggestions() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let username = format!("longname_{}", &Uuid::new_v4().simple().to_string()[..22]);
    assert_eq!(username.len(), 31);
    register(&app, &username, "athlete").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "display_name": "Émile Zoë",
            "password": PASSWORD,
            "role": "athlete"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 3);
    for suggestion in suggestions {
        assert!(suggestion.as_str().unwrap().len() <= 32, "{suggestion}");
    }
}

#[tokio::test]
#[serial]
async fn test_logout_revokes_access_token() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let account = register(&app, &unique_username("leaving"), "athlete").await;

    let (status, _) = post(&app, "/api/auth/logout", &account.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/api/auth/me", &account.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh_token = account.body["refresh_token"].as_str().unwrap();
    let (status, _) = get(&app, "/api/auth/me", refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_roles_cannot_enter_other_workspaces() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let athlete = register(&app, &unique_username("ath"), "athlete").await;

    let (status, body) = get(&app, "/api/manager/dashboard", &athlete.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = get(&app, "/api/athlete/dashboard", &athlete.token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "profile_incomplete");
}

#[tokio::test]
#[serial]
async fn test_trainer_approval_gates_workspace() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (trainer_token, trainer_id) = trainer_at(&app, &gym_id, "Sam Rivera").await;

    let (status, body) = get(&app, "/api/trainer/dashboard", &trainer_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "pending_approval");

    let (status, profile) = get(&app, "/api/trainer/profile", &trainer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["gym_id"], gym_id.as_str());

    let (status, listed) = get(&app, &format!("/api/gyms/{gym_id}/trainers"), &trainer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    let (status, approved) = post(
        &app,
        &format!("/api/manager/trainers/{trainer_id}/approve"),
        &manager_token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["trainer_approved"], true);
    assert!(approved["trainer_approval_date"].is_string());

    let (status, dashboard) = get(&app, "/api/trainer/dashboard", &trainer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["athletes_count"], 0);

    let (status, revoked) = post(
        &app,
        &format!("/api/manager/trainers/{trainer_id}/revoke"),
        &manager_token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoked["trainer_approved"], false);
    assert!(revoked["trainer_approval_date"].is_null());

    let (status, _) = get(&app, "/api/trainer/dashboard", &trainer_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn test_visit_check_in_and_out() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (athlete_token, _) = athlete_at(&app, &gym_id, None).await;

    let (status, visit) = post(&app, "/api/athlete/visits/check-in", &athlete_token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{visit}");
    assert!(visit["check_out_time"].is_null());

    let (status, body) = post(&app, "/api/athlete/visits/check-in", &athlete_token, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, active) = get(&app, "/api/athlete/visits/active", &athlete_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().unwrap().len(), 1);

    let (status, stats) = get(&app, "/api/manager/dashboard", &manager_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["members_count"], 1);
    assert_eq!(stats["active_visits"], 1);

    let (status, closed) = post(&app, "/api/athlete/visits/check-out", &athlete_token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(closed["check_out_time"].is_string());
    assert_eq!(closed["duration"], "0h 0m");

    let (status, body) = post(&app, "/api/athlete/visits/check-out", &athlete_token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, history) = get(&app, "/api/athlete/visits/history?limit=5", &athlete_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, dashboard) = get(&app, "/api/athlete/dashboard", &athlete_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["visits_count"], 1);
    assert_eq!(dashboard["checked_in"], false);

    let window = dashboard["visits_last_7_days"].as_array().unwrap();
    assert_eq!(window.len(), 7);
    let total: i64 = window.iter().map(|day| day["visits"].as_i64().unwrap()).sum();
    assert_eq!(total, 1);
}

#[tokio::test]
#[serial]
async fn test_memberships_and_plans() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (athlete_token, _) = athlete_at(&app, &gym_id, None).await;

    let (status, body) = post(
        &app,
        "/api/manager/plans",
        &manager_token,
        json!({ "plan_name": "Forever", "duration_months": 48, "price": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, plan) = post(
        &app,
        "/api/manager/plans",
        &manager_token,
        json!({ "plan_name": "Quarterly", "duration_months": 3, "price": 89.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{plan}");
    let plan_id = plan["id"].as_str().unwrap();

    let (status, plans) = get(&app, "/api/athlete/plans", &athlete_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans.as_array().unwrap().len(), 1);

    let (status, membership) = post(
        &app,
        "/api/athlete/memberships",
        &athlete_token,
        json!({ "plan_id": plan_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{membership}");
    assert_eq!(membership["payment_status"], "pending");
    assert_eq!(membership["active"], true);

    let (status, me) = get(&app, "/api/auth/me", &athlete_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["membership_expiry_date"], membership["end_date"]);

    let membership_id = membership["id"].as_str().unwrap();
    let (status, paid) = put(
        &app,
        &format!("/api/manager/memberships/{membership_id}/payment"),
        &manager_token,
        json!({ "payment_status": "paid" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "paid");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/manager/plans/{plan_id}"),
        Some(&manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
#[serial]
async fn test_reviews_are_limited_to_own_gym_and_trainer() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (_, other_gym_id) = manager_with_gym(&app).await;
    let (trainer_token, trainer_id) = trainer_at(&app, &gym_id, "Alex Moreau").await;
    post(
        &app,
        &format!("/api/manager/trainers/{trainer_id}/approve"),
        &manager_token,
        json!({}),
    )
    .await;

    let (athlete_token, profile) = athlete_at(&app, &gym_id, Some(&trainer_id)).await;
    assert_eq!(profile["trainer_name"], "Alex Moreau");

    let (status, _) = post(
        &app,
        "/api/athlete/reviews",
        &athlete_token,
        json!({ "target": "gym", "target_id": other_gym_id, "rating": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post(
        &app,
        "/api/athlete/reviews",
        &athlete_token,
        json!({ "target": "gym", "rating": 6 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/athlete/reviews",
        &athlete_token,
        json!({ "target": "gym", "rating": 5, "comment": "Clean and friendly" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post(
        &app,
        "/api/athlete/reviews",
        &athlete_token,
        json!({ "target": "trainer", "target_id": trainer_id, "rating": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, reviews) = get(&app, "/api/manager/reviews", &manager_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews["summary"]["count"], 1);
    assert_eq!(reviews["summary"]["average"], 5.0);
    assert_eq!(reviews["reviews"][0]["comment"], "Clean and friendly");

    let (status, dashboard) = get(&app, "/api/trainer/dashboard", &trainer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["athletes_count"], 1);
    assert_eq!(dashboard["avg_rating"], 4.0);
}

#[tokio::test]
#[serial]
async fn test_messaging_between_athlete_and_trainer() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (trainer_token, trainer_id) = trainer_at(&app, &gym_id, "Priya Nair").await;
    post(
        &app,
        &format!("/api/manager/trainers/{trainer_id}/approve"),
        &manager_token,
        json!({}),
    )
    .await;
    let (athlete_token, _) = athlete_at(&app, &gym_id, Some(&trainer_id)).await;

    let (_, recipients) = get(&app, "/api/messages/recipients", &athlete_token).await;
    let trainer_user = recipients
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["role"] == "trainer")
        .expect("assigned trainer is a recipient")
        .clone();
    assert_eq!(trainer_user["display_name"], "Priya Nair");
    let trainer_user_id = trainer_user["user_id"].as_str().unwrap();

    let (status, _) = post(
        &app,
        &format!("/api/messages/{trainer_user_id}"),
        &athlete_token,
        json!({ "message": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent) = post(
        &app,
        &format!("/api/messages/{trainer_user_id}"),
        &athlete_token,
        json!({ "message": "Can we move Thursday's session?" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["read"], false);
    let athlete_user_id = sent["sender_id"].as_str().unwrap();

    let (_, unread) = get(&app, "/api/messages/unread", &trainer_token).await;
    assert_eq!(unread["unread"], 1);

    let (_, contacts) = get(&app, "/api/messages/contacts", &trainer_token).await;
    assert_eq!(contacts[0]["user_id"], athlete_user_id);
    assert_eq!(contacts[0]["unread_count"], 1);

    let (status, conversation) =
        get(&app, &format!("/api/messages/{athlete_user_id}"), &trainer_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation.as_array().unwrap().len(), 1);

    let (_, unread) = get(&app, "/api/messages/unread", &trainer_token).await;
    assert_eq!(unread["unread"], 0);
}

#[tokio::test]
#[serial]
async fn test_support_ticket_lifecycle() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, gym_id) = manager_with_gym(&app).await;
    let (athlete_token, _) = athlete_at(&app, &gym_id, None).await;

    let (status, ticket) = post(
        &app,
        "/api/athlete/tickets",
        &athlete_token,
        json!({ "subject": "Locker 14", "message": "The lock is jammed." }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{ticket}");
    assert_eq!(ticket["status"], "open");
    let ticket_id = ticket["id"].as_str().unwrap();

    let (_, open) = get(&app, "/api/manager/tickets?status=open", &manager_token).await;
    assert_eq!(open.as_array().unwrap().len(), 1);

    let (status, all) = get(&app, "/api/manager/tickets?status=All", &manager_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = post(
        &app,
        &format!("/api/athlete/tickets/{ticket_id}/responses"),
        &athlete_token,
        json!({ "message": "Any update?", "status": "closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, detail) = post(
        &app,
        &format!("/api/manager/tickets/{ticket_id}/responses"),
        &manager_token,
        json!({ "message": "Replaced the lock.", "status": "closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{detail}");
    assert_eq!(detail["ticket"]["status"], "closed");
    assert_eq!(detail["responses"].as_array().unwrap().len(), 1);

    let (status, _) = post(
        &app,
        &format!("/api/athlete/tickets/{ticket_id}/responses"),
        &athlete_token,
        json!({ "message": "Still jammed." }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, open) = get(&app, "/api/manager/tickets?status=open", &manager_token).await;
    assert!(open.as_array().unwrap().is_empty());

    let (status, reopened) = put(
        &app,
        &format!("/api/manager/tickets/{ticket_id}/status"),
        &manager_token,
        json!({ "status": "in_progress" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "in_progress");
}

#[tokio::test]
#[serial]
async fn test_manager_registers_member() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool);

    let (manager_token, _) = manager_with_gym(&app).await;
    let username = unique_username("walkin");

    let (status, member) = post(
        &app,
        "/api/manager/members",
        &manager_token,
        json!({
            "username": username,
            "password": PASSWORD,
            "full_name": "Jordan Blake",
            "age": 41,
            "gender": "Other",
            "weight": 80.0,
            "height": 181.0,
            "goals": "Mobility"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{member}");
    assert_eq!(member["manually_registered"], true);

    let (status, members) = get(&app, "/api/manager/members", &manager_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);

    let (status, _) = login(&app, &username, "athlete").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_purge_removes_only_dead_tokens() {
    let Some(pool) = test_database().await else {
        return;
    };
    let app = common::app(pool.clone());
    let auth = AuthService::new(pool.clone(), TEST_JWT_SECRET);

    // Start from a table with no dead rows
    auth.purge_expired_tokens().await.unwrap();

    let account = register(&app, &unique_username("purge"), "athlete").await;
    let user_id = Uuid::parse_str(account.body["user"]["id"].as_str().unwrap()).unwrap();

    let expired_jti = Uuid::new_v4().to_string();
    let live_jti = Uuid::new_v4().to_string();
    for (jti, offset) in [(&expired_jti, "-1 hour"), (&live_jti, "1 hour")] {
        sqlx::query("INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, NOW() + $2::interval)")
            .bind(jti)
            .bind(offset)
            .execute(&pool)
            .await
            .unwrap();
    }

    for (hash, offset, revoked) in [
        ("expired", "-1 day", false),
        ("revoked", "1 day", true),
        ("live", "1 day", false),
    ] {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked)
             VALUES ($1, $2, $3, NOW() + $4::interval, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(hash)
        .bind(offset)
        .bind(revoked)
        .execute(&pool)
        .await
        .unwrap();
    }

    let (blacklist, refresh) = auth.purge_expired_tokens().await.unwrap();
    assert_eq!(blacklist, 1);
    assert_eq!(refresh, 2);

    let remaining_jtis: Vec<String> =
        sqlx::query_scalar("SELECT jti FROM token_blacklist WHERE jti = ANY($1)")
            .bind(vec![expired_jti.clone(), live_jti.clone()])
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(remaining_jtis, vec![live_jti]);

    let mut remaining_hashes: Vec<String> =
        sqlx::query_scalar("SELECT token_hash FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    remaining_hashes.sort();

    // The registration's own refresh token is live too
    assert_eq!(remaining_hashes.len(), 2);
    assert!(remaining_hashes.contains(&"live".to_string()));
    assert!(!remaining_hashes.contains(&"expired".to_string()));
    assert!(!remaining_hashes.contains(&"revoked".to_string()));
}

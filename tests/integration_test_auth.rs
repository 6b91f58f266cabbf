mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{TestApp, PASSWORD};
use master_booking::domain::models::user::Role;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_register_logs_in_as_client() {
    let app = TestApp::new().await;

    let (status, body) = app.send("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "  New.Client@Example.com ",
        "password": "hunter22",
        "name": "New Client",
        "phone": "+70000000000"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "client");
    assert_eq!(body["user"]["email"], "new.client@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(!body["csrf_token"].as_str().unwrap().is_empty());

    let auth = app.login("new.client@example.com", "hunter22").await;
    let (status, me) = app.send("GET", "/api/v1/users/me", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "New Client");
    assert_eq!(me["phone"], "+70000000000");
}

#[tokio::test]
async fn test_register_rejects_bad_input_and_duplicates() {
    let app = TestApp::new().await;
    app.seed_user("taken@example.com", Role::Client).await;

    let cases = [
        (json!({ "email": "not-an-email", "password": "hunter22", "name": "A" }), StatusCode::BAD_REQUEST),
        (json!({ "email": "a@example.com", "password": "short", "name": "A" }), StatusCode::BAD_REQUEST),
        (json!({ "email": "a@example.com", "password": "hunter22", "name": "   " }), StatusCode::BAD_REQUEST),
        (json!({ "email": "TAKEN@example.com", "password": "hunter22", "name": "A" }), StatusCode::CONFLICT),
    ];
    for (payload, expected) in cases {
        let (status, _) = app.send("POST", "/api/v1/auth/register", None, Some(payload.clone())).await;
        assert_eq!(status, expected, "payload {}", payload);
    }
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await;
    app.seed_user("client@example.com", Role::Client).await;

    let (status, body) = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "client@example.com",
        "password": "wrong-password"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "nobody@example.com",
        "password": PASSWORD
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutations_require_csrf_token() {
    let app = TestApp::new().await;
    let (_, auth) = app.user("client@example.com", Role::Client).await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/v1/users/notifications/read")
        .header(header::COOKIE, format!("access_token={}", auth.access_token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "ids": ["x"] }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("PUT")
        .uri("/api/v1/users/notifications/read")
        .header(header::COOKIE, format!("access_token={}", auth.access_token))
        .header("X-CSRF-Token", "forged")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "ids": ["x"] }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reads need no CSRF header.
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/users/me")
        .header(header::COOKIE, format!("access_token={}", auth.access_token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotates_and_logout_revokes() {
    let app = TestApp::new().await;
    app.seed_user("client@example.com", Role::Client).await;

    let login = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "email": "client@example.com", "password": PASSWORD }).to_string()))
            .unwrap()
    ).await.unwrap();
    let refresh_token = cookie_value(&login, "refresh_token");

    let refresh = |token: String| {
        let router = app.router.clone();
        async move {
            router.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={}", token))
                    .body(Body::empty())
                    .unwrap()
            ).await.unwrap()
        }
    };

    let rotated = refresh(refresh_token.clone()).await;
    assert_eq!(rotated.status(), StatusCode::OK);
    let next_token = cookie_value(&rotated, "refresh_token");
    assert_ne!(next_token, refresh_token);

    // The consumed token is gone.
    assert_eq!(refresh(refresh_token).await.status(), StatusCode::UNAUTHORIZED);

    let logout = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/logout")
            .header(header::COOKIE, format!("refresh_token={}", next_token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    assert_eq!(refresh(next_token).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_masters() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, client) = app.user("client@example.com", Role::Client).await;
    let payload = json!({ "email": "master@example.com", "password": "hunter22", "name": "Master" });

    let (status, _) = app.send("POST", "/api/v1/users/masters", Some(&client), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("POST", "/api/v1/users/masters", Some(&admin), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let master_id = body["id"].as_str().unwrap();

    let master = app.login("master@example.com", "hunter22").await;
    let (_, me) = app.send("GET", "/api/v1/users/me", Some(&master), None).await;
    assert_eq!(me["id"], master_id);
    assert_eq!(me["role"], "master");

    let (status, _) = app.send("POST", "/api/v1/users/masters", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn cookie_value(response: &axum::response::Response, name: &str) -> String {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|c| c.strip_prefix(&prefix).map(|rest| rest.split(';').next().unwrap_or("").to_string()))
        .unwrap_or_else(|| panic!("No {} cookie returned", name))
}

#[tokio::test]
async fn test_role_gated_extractor_is_usable_from_outside_the_crate() {
    use master_booking::api::extractors::auth::{Authorized, MasterOnly};
    use master_booking::domain::models::user::Identity;
    use std::marker::PhantomData;

    let gate: Authorized<MasterOnly> = Authorized(Identity { user_id: "m1".into(), role: Role::Master }, PhantomData);
    let Authorized(who, _) = gate;
    assert_eq!(who.user_id, "m1");

    // The same destructuring backs every role-gated handler.
    let app = TestApp::new().await;
    let (_, client) = app.user("client@example.com", Role::Client).await;
    let (_, master) = app.user("master@example.com", Role::Master).await;
    let (status, _) = app.send("GET", "/api/v1/users/statistics", Some(&client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, stats) = app.send("GET", "/api/v1/users/statistics", Some(&master), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["general"]["completed_bookings"], 0);
}

mod common;

use axum::http::StatusCode;
use common::TestApp;
use master_booking::domain::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn test_admin_creates_services() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, master) = app.user("master@example.com", Role::Master).await;

    let (status, body) = app.send("POST", "/api/v1/services", Some(&admin), Some(json!({
        "name": "Manicure",
        "description": "Classic manicure",
        "price": 1500,
        "duration": 45
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());

    let invalid = [
        json!({ "name": "  ", "price": 100, "duration": 30 }),
        json!({ "name": "Pedicure", "price": -1, "duration": 30 }),
        json!({ "name": "Pedicure", "price": 100, "duration": 0 }),
    ];
    for payload in invalid {
        let (status, _) = app.send("POST", "/api/v1/services", Some(&admin), Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
    }

    let (status, _) = app.send("POST", "/api/v1/services", Some(&master), Some(json!({
        "name": "Pedicure", "price": 100, "duration": 30
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, services) = app.send("GET", "/api/v1/services", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let services = services.as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["name"], "Manicure");
    assert_eq!(services[0]["duration"], 45);
    assert_eq!(services[0]["masters_count"], 0);
}

#[tokio::test]
async fn test_master_price_overrides() {
    let app = TestApp::new().await;
    let (master_id, master) = app.user("master@example.com", Role::Master).await;
    let (_, client) = app.user("client@example.com", Role::Client).await;
    let service_id = app.seed_service("Haircut", 1000).await;
    let uri = format!("/api/v1/services/{}/price", service_id);

    let (status, _) = app.send("PUT", &uri, Some(&master), Some(json!({ "price": 900 }))).await;
    assert_eq!(status, StatusCode::OK);
    // A second call replaces the first.
    let (status, _) = app.send("PUT", &uri, Some(&master), Some(json!({ "price": 800 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, masters) = app.send("GET", &format!("/api/v1/services/{}/masters", service_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let masters = masters.as_array().unwrap();
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0]["id"], master_id);
    assert_eq!(masters[0]["custom_price"], 800);
    assert_eq!(masters[0]["default_price"], 1000);

    let (_, services) = app.send("GET", "/api/v1/services", None, None).await;
    assert_eq!(services[0]["masters_count"], 1);

    let (status, _) = app.send("PUT", &uri, Some(&master), Some(json!({ "price": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send("PUT", &uri, Some(&client), Some(json!({ "price": 500 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let app = TestApp::new().await;
    let (_, master) = app.user("master@example.com", Role::Master).await;

    let (status, _) = app.send("GET", "/api/v1/services/missing/masters", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send("PUT", "/api/v1/services/missing/price", Some(&master), Some(json!({ "price": 500 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

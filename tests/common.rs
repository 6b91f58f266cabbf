use master_booking::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::repositories::{
        sqlite_auth_repo::SqliteAuthRepo,
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_notification_repo::SqliteNotificationRepo,
        sqlite_service_repo::SqliteServiceRepo,
        sqlite_slot_repo::SqliteSlotRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    domain::models::{service::Service, slot::Slot, user::{Role, User}},
    domain::services::{auth_service::{hash_password, AuthService}, booking_lifecycle::BookingPolicy},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::Value;

pub const PASSWORD: &str = "secret-password";

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(StdDuration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            business_timezone: chrono_tz::UTC,
            cancellation_cutoff_hours: 24,
            worker_interval_secs: 60,
            admin_email: None,
            admin_password: None,
        };

        let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone()).expect("Invalid test keys"));
        let policy = BookingPolicy::new(config.business_timezone, config.cancellation_cutoff_hours);

        let state = Arc::new(AppState {
            config: config.clone(),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo,
            service_repo: Arc::new(SqliteServiceRepo::new(pool.clone())),
            slot_repo: Arc::new(SqliteSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            auth_service,
            policy,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Stores a user with [`PASSWORD`] directly, bypassing the API.
    pub async fn seed_user(&self, email: &str, role: Role) -> String {
        let user = User::new(email.to_string(), format!("{} user", role), None, hash_password(PASSWORD).unwrap(), role);
        self.state.user_repo.create(&user).await.unwrap().id
    }

    pub async fn seed_service(&self, name: &str, price: i64) -> String {
        let service = Service::new(name.to_string(), String::new(), price, 60, None);
        self.state.service_repo.create(&service).await.unwrap().id
    }

    /// Stores a one-hour slot starting at `start`, which may lie in the past.
    pub async fn seed_slot(&self, master_id: &str, start: NaiveDateTime) -> String {
        let start_time = start.time();
        let end_time = start_time.overflowing_add_signed(Duration::hours(1)).0;
        let end_time = if end_time > start_time { end_time } else { NaiveTime::from_hms_opt(23, 59, 59).unwrap() };

        let slot = Slot::new(master_id.to_string(), start.date(), start_time, end_time);
        self.state.slot_repo.create_many(&[slot]).await.unwrap().remove(0).id
    }

    /// Wall-clock time in the business zone, truncated to the minute.
    pub fn now(&self) -> NaiveDateTime {
        let now = self.state.policy.now_local();
        now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap()
    }

    /// A start time on the hour, `days` days from today.
    pub fn days_ahead(&self, days: i64, hour: u32) -> NaiveDateTime {
        (self.now().date() + Duration::days(days)).and_hms_opt(hour, 0, 0).unwrap()
    }

    pub async fn slot_available(&self, slot_id: &str) -> bool {
        self.state.slot_repo.find_by_id(slot_id).await.unwrap().unwrap().is_available
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let payload = serde_json::json!({
            "email": email,
            "password": password
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookies: Vec<String> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        let access_token_cookie = cookies.iter()
            .find(|c| c.contains("access_token="))
            .expect("No access_token cookie returned");

        let start = access_token_cookie.find("access_token=").unwrap() + 13;
        let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
        let access_token = access_token_cookie[start..start+end].to_string();

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Seeds a user of `role` and logs them in.
    pub async fn user(&self, email: &str, role: Role) -> (String, AuthHeaders) {
        let id = self.seed_user(email, role).await;
        let auth = self.login(email, PASSWORD).await;
        (id, auth)
    }

    pub async fn send(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    pub async fn book(&self, client: &AuthHeaders, master_id: &str, service_id: &str, slot_id: &str) -> (StatusCode, Value) {
        self.send("POST", "/api/v1/bookings", Some(client), Some(serde_json::json!({
            "master_id": master_id,
            "service_id": service_id,
            "slot_id": slot_id
        }))).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

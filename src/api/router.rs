use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, booking, health, service, slot, user};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Users
        .route("/api/v1/users/me", get(user::get_me))
        .route("/api/v1/users/notifications", get(user::list_notifications))
        .route("/api/v1/users/notifications/read", put(user::mark_notifications_read))
        .route("/api/v1/users/statistics", get(user::get_statistics))
        .route("/api/v1/users/masters", post(user::create_master))

        // Catalog
        .route("/api/v1/services", get(service::list_services).post(service::create_service))
        .route("/api/v1/services/{id}/masters", get(service::list_service_masters))
        .route("/api/v1/services/{id}/price", put(service::set_master_price))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/my", get(booking::list_my_bookings))
        .route("/api/v1/bookings/{id}/cancel", put(booking::cancel_booking))
        .route("/api/v1/bookings/{id}/confirm", put(booking::confirm_booking))
        .route("/api/v1/bookings/{id}/reschedule", put(booking::reschedule_booking))

        // Slots
        .route("/api/v1/slots", post(slot::generate_slots))
        .route("/api/v1/slots/{id}", delete(slot::delete_slot))
        .route("/api/v1/slots/master/{id}", get(slot::list_master_slots))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::{AuthUser, Authorized, ClientOnly, ClientOrMaster, MasterOnly};
use crate::api::dtos::requests::{require_non_empty, CreateBookingRequest, RescheduleBookingRequest};
use crate::api::dtos::responses::ActionResponse;
use crate::domain::models::booking::{Booking, NewBookingParams};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Authorized(client, _): Authorized<ClientOnly>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = Booking::new(NewBookingParams {
        client_id: client.user_id.clone(),
        master_id: require_non_empty("master_id", &payload.master_id)?.to_string(),
        service_id: require_non_empty("service_id", &payload.service_id)?.to_string(),
        slot_id: require_non_empty("slot_id", &payload.slot_id)?.to_string(),
        notes: payload.notes,
    });

    let created = state.booking_repo.create(&booking, &state.policy).await
        .inspect_err(|e| warn!("create_booking: rejected for client {}: {}", client.user_id, e))?;

    info!("Booking {} created on slot {:?} at price {}", created.id, created.slot_id, created.price);

    Ok((StatusCode::CREATED, Json(ActionResponse::new(created.id, "Booking created"))))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(who): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_for(&who).await?;
    Ok(Json(bookings))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Authorized(master, _): Authorized<MasterOnly>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.confirm(&booking_id, &master.user_id).await?;

    info!("Booking {} confirmed by master {}", booking.id, master.user_id);

    Ok(Json(ActionResponse::new(booking.id, "Booking confirmed")))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Authorized(who, _): Authorized<ClientOrMaster>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.cancel(&booking_id, &who.user_id, &state.policy).await
        .inspect_err(|e| warn!("cancel_booking: {} rejected: {}", booking_id, e))?;

    Ok(Json(ActionResponse::new(booking.id, "Booking cancelled")))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Authorized(client, _): Authorized<ClientOnly>,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_slot_id = require_non_empty("new_slot_id", &payload.new_slot_id)?;

    let booking = state.booking_repo.reschedule(&booking_id, &client.user_id, new_slot_id, &state.policy).await
        .inspect_err(|e| warn!("reschedule_booking: {} rejected: {}", booking_id, e))?;

    Ok(Json(ActionResponse::new(booking.id, "Booking rescheduled")))
}

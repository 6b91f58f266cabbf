use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::{AdminOnly, Authorized, MasterOnly};
use crate::api::dtos::requests::{require_non_empty, CreateServiceRequest, SetPriceRequest};
use crate::api::dtos::responses::ActionResponse;
use crate::domain::models::service::{MasterServicePrice, Service};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let services = state.service_repo.list().await?;
    Ok(Json(services))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    _admin: Authorized<AdminOnly>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_non_empty("name", &payload.name)?.to_string();
    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if payload.duration <= 0 {
        return Err(AppError::Validation("duration must be positive".into()));
    }

    let service = Service::new(name, payload.description.trim().to_string(), payload.price, payload.duration, payload.image_url);
    let created = state.service_repo.create(&service).await?;

    info!("Service {} created: {}", created.id, created.name);

    Ok((StatusCode::CREATED, Json(ActionResponse::new(created.id, "Service created"))))
}

pub async fn list_service_masters(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.service_repo.find_by_id(&service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    let masters = state.service_repo.list_masters(&service_id).await?;
    Ok(Json(masters))
}

pub async fn set_master_price(
    State(state): State<Arc<AppState>>,
    Authorized(master, _): Authorized<MasterOnly>,
    Path(service_id): Path<String>,
    Json(payload): Json<SetPriceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }

    state.service_repo.find_by_id(&service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    let saved = state.service_repo.upsert_master_price(&MasterServicePrice {
        master_id: master.user_id.clone(),
        service_id,
        price: payload.price,
    }).await?;

    info!("Master {} set price {} for service {}", saved.master_id, saved.price, saved.service_id);

    Ok(Json(ActionResponse::new(saved.service_id, "Price updated")))
}

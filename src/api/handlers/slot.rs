use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::{Authorized, MasterOrAdmin};
use crate::api::dtos::requests::{parse_date, parse_time, GenerateSlotsRequest, SlotListQuery};
use crate::api::dtos::responses::{ActionResponse, SlotsCreatedResponse};
use crate::domain::models::user::{Identity, Role};
use crate::domain::services::slot_generator::{self, DEFAULT_SLOT_DURATION_MIN};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn generate_slots(
    State(state): State<Arc<AppState>>,
    Authorized(who, _): Authorized<MasterOrAdmin>,
    Json(payload): Json<GenerateSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let master_id = resolve_master(&state, &who, payload.master_id.as_deref()).await?;

    let first = parse_date(&payload.date)?;
    let last = payload.until.as_deref().map(parse_date).transpose()?;
    let start = parse_time(&payload.start_time)?;
    let end = parse_time(&payload.end_time)?;
    let duration = payload.duration.unwrap_or(DEFAULT_SLOT_DURATION_MIN);

    let dates = slot_generator::date_range(first, last)?;
    let slots = slot_generator::generate(&master_id, &dates, start, end, duration)?;
    if slots.is_empty() {
        return Err(AppError::Validation("The window is shorter than one slot".into()));
    }

    let created = state.slot_repo.create_many(&slots).await?;

    info!("Generated {} slots for master {} from {} over {} day(s)", created.len(), master_id, first, dates.len());

    Ok((StatusCode::CREATED, Json(SlotsCreatedResponse {
        created: created.len(),
        slot_ids: created.into_iter().map(|s| s.id).collect(),
    })))
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Authorized(who, _): Authorized<MasterOrAdmin>,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner = match who.role {
        Role::Admin => None,
        _ => Some(who.user_id.as_str()),
    };

    state.slot_repo.delete(&slot_id, owner).await?;

    info!("Slot {} deleted by {}", slot_id, who.user_id);

    Ok(Json(ActionResponse::new(slot_id, "Slot deleted")))
}

pub async fn list_master_slots(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<String>,
    Query(query): Query<SlotListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let slots = state.slot_repo.list_by_master(&master_id, date).await?;
    Ok(Json(slots))
}

/// Masters generate for themselves; admins must name an existing master.
async fn resolve_master(state: &AppState, who: &Identity, requested: Option<&str>) -> Result<String, AppError> {
    match who.role {
        Role::Admin => {
            let master_id = requested
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or(AppError::Validation("master_id is required".into()))?;

            match state.user_repo.find_by_id(master_id).await? {
                Some(user) if user.role == Role::Master => Ok(user.id),
                _ => Err(AppError::NotFound("Master not found".into())),
            }
        }
        _ => match requested {
            Some(id) if id != who.user_id => Err(AppError::Forbidden("Masters can only manage their own slots".into())),
            _ => Ok(who.user_id.clone()),
        },
    }
}

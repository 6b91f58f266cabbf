use axum::{extract::{State, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::{AdminOnly, AuthUser, Authorized, MasterOrAdmin};
use crate::api::dtos::requests::{CreateMasterRequest, MarkReadRequest, StatisticsQuery};
use crate::api::dtos::responses::{ActionResponse, MarkedReadResponse};
use crate::api::handlers::auth::create_account;
use crate::domain::models::auth::UserProfile;
use crate::domain::models::user::Role;
use crate::domain::services::statistics;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const NOTIFICATION_PAGE: i64 = 50;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(who): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&who.user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(UserProfile::from(user)))
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(who): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let notifications = state.notification_repo.list_for_user(&who.user_id, NOTIFICATION_PAGE).await?;
    Ok(Json(notifications))
}

pub async fn mark_notifications_read(
    State(state): State<Arc<AppState>>,
    AuthUser(who): AuthUser,
    Json(payload): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.ids.is_empty() {
        return Err(AppError::Validation("ids must not be empty".into()));
    }

    let updated = state.notification_repo.mark_read(&who.user_id, &payload.ids).await?;
    Ok(Json(MarkedReadResponse { updated }))
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Authorized(who, _): Authorized<MasterOrAdmin>,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let master_id = match who.role {
        Role::Admin => {
            let requested = query.master_id
                .ok_or(AppError::Validation("master_id is required".into()))?;
            match state.user_repo.find_by_id(&requested).await? {
                Some(user) if user.role == Role::Master => user.id,
                _ => return Err(AppError::NotFound("Master not found".into())),
            }
        }
        _ => who.user_id,
    };

    let rows = state.booking_repo.list_stat_rows(&master_id).await?;
    Ok(Json(statistics::compute(&rows)))
}

pub async fn create_master(
    State(state): State<Arc<AppState>>,
    Authorized(admin, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateMasterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let master = create_account(&state, payload.email, payload.password, payload.name, payload.phone, Role::Master).await?;

    info!("Admin {} created master {}", admin.user_id, master.id);

    Ok((StatusCode::CREATED, Json(ActionResponse::new(master.id, "Master created"))))
}

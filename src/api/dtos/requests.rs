use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateMasterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub duration: i32,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SetPriceRequest {
    pub price: i64,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub master_id: String,
    pub service_id: String,
    pub slot_id: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleBookingRequest {
    pub new_slot_id: String,
}

/// Dates are `YYYY-MM-DD`, times `HH:MM` in the business time zone.
#[derive(Deserialize)]
pub struct GenerateSlotsRequest {
    pub master_id: Option<String>,
    pub date: String,
    pub until: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub duration: Option<i64>,
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct SlotListQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub master_id: Option<String>,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", value)))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time '{}' (expected HH:MM)", value)))
}

pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

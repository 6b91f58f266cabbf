use serde::Serialize;
use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;

use super::booking::BookingStatus;

/// Minimal projection of a master's booking used to compute statistics.
#[derive(Debug, FromRow, Clone)]
pub struct StatBookingRow {
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub price: i64,
    pub client_id: String,
    pub service_id: String,
    pub service_name: String,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

#[derive(Debug, Serialize, Default, PartialEq)]
pub struct GeneralStats {
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub upcoming_bookings: i64,
    pub total_revenue: i64,
    pub unique_clients: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WeekdayCount {
    pub day_name: String,
    pub bookings_count: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ServiceStat {
    pub service_id: String,
    pub name: String,
    pub bookings_count: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HourCount {
    pub hour: u32,
    pub bookings_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterStatistics {
    pub general: GeneralStats,
    pub by_week_day: Vec<WeekdayCount>,
    pub popular_services: Vec<ServiceStat>,
    pub by_hour: Vec<HourCount>,
}

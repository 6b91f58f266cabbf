use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Slot {
    pub id: String,
    pub master_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(master_id: String, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            master_id,
            date,
            start_time,
            end_time,
            is_available: true,
            created_at: Utc::now(),
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// A slot as shown on a master's schedule, with its active booking if any.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct SlotView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub slot: Slot,
    pub booking_id: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub status: Option<String>,
}

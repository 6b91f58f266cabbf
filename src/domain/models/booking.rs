use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub master_id: String,
    pub service_id: String,
    pub slot_id: Option<String>,
    pub price: i64,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub client_id: String,
    pub master_id: String,
    pub service_id: String,
    pub slot_id: String,
    pub notes: Option<String>,
}

impl Booking {
    /// Price is left at zero; the store resolves it inside the booking transaction.
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            client_id: params.client_id,
            master_id: params.master_id,
            service_id: params.service_id,
            slot_id: Some(params.slot_id),
            price: 0,
            notes: params.notes.filter(|n| !n.trim().is_empty()),
            status: BookingStatus::Pending,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn counterparty_of(&self, user_id: &str) -> &str {
        if user_id == self.client_id { &self.master_id } else { &self.client_id }
    }
}

/// A booking together with the wall-clock start of the slot it holds.
#[derive(Debug, FromRow, Clone)]
pub struct BookingWithSlot {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub slot_date: Option<NaiveDate>,
    pub slot_start_time: Option<NaiveTime>,
}

impl BookingWithSlot {
    pub fn slot_start(&self) -> Option<NaiveDateTime> {
        Some(self.slot_date?.and_time(self.slot_start_time?))
    }
}

/// Booking row as listed to its client or master.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct BookingView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub service_name: String,
    pub duration: i32,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub master_name: String,
    pub master_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking::new(NewBookingParams {
            client_id: "client".into(),
            master_id: "master".into(),
            service_id: "svc".into(),
            slot_id: "slot".into(),
            notes: Some("   ".into()),
        })
    }

    #[test]
    fn test_new_booking_is_pending_and_drops_blank_notes() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.notes.is_none());
        assert_eq!(b.slot_id.as_deref(), Some("slot"));
    }

    #[test]
    fn test_counterparty() {
        let b = booking();
        assert_eq!(b.counterparty_of("client"), "master");
        assert_eq!(b.counterparty_of("master"), "client");
    }
}

use crate::domain::models::{
    auth::RefreshTokenRecord,
    booking::{Booking, BookingView},
    notification::Notification,
    service::{MasterServicePrice, Service, ServiceMaster, ServiceSummary},
    slot::{Slot, SlotView},
    statistics::StatBookingRow,
    user::{Identity, User},
};
use crate::domain::services::booking_lifecycle::BookingPolicy;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError>;
    async fn list(&self) -> Result<Vec<ServiceSummary>, AppError>;
    async fn list_masters(&self, service_id: &str) -> Result<Vec<ServiceMaster>, AppError>;
    /// Inserts or replaces the single override row for the pair.
    async fn upsert_master_price(&self, price: &MasterServicePrice) -> Result<MasterServicePrice, AppError>;
}

/// Availability windows. Writes keep one master's slots non-overlapping.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Inserts all slots in one transaction, or none if any overlaps an existing slot.
    async fn create_many(&self, slots: &[Slot]) -> Result<Vec<Slot>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError>;
    async fn list_by_master(&self, master_id: &str, date: Option<NaiveDate>) -> Result<Vec<SlotView>, AppError>;
    /// `owner_id` of `None` skips the ownership check (admin).
    async fn delete(&self, id: &str, owner_id: Option<&str>) -> Result<(), AppError>;
}

/// The booking lifecycle. Every mutating method is one transaction that also
/// writes the notification for the transition.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking, policy: &BookingPolicy) -> Result<Booking, AppError>;
    async fn confirm(&self, booking_id: &str, master_id: &str) -> Result<Booking, AppError>;
    async fn cancel(&self, booking_id: &str, user_id: &str, policy: &BookingPolicy) -> Result<Booking, AppError>;
    async fn reschedule(&self, booking_id: &str, client_id: &str, new_slot_id: &str, policy: &BookingPolicy) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_for(&self, who: &Identity) -> Result<Vec<BookingView>, AppError>;
    async fn list_stat_rows(&self, master_id: &str) -> Result<Vec<StatBookingRow>, AppError>;
    /// Marks confirmed bookings whose slot ended at or before `now` as completed.
    async fn complete_elapsed(&self, now: NaiveDateTime) -> Result<u64, AppError>;
    /// Notifies clients of active bookings starting in `(now, until]` once.
    async fn send_due_reminders(&self, now: NaiveDateTime, until: NaiveDateTime) -> Result<u64, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>, AppError>;
    async fn mark_read(&self, user_id: &str, ids: &[String]) -> Result<u64, AppError>;
}

pub mod sqlite_auth_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_service_repo;
pub mod sqlite_slot_repo;
pub mod sqlite_user_repo;

pub mod postgres_auth_repo;
pub mod postgres_booking_repo;
pub mod postgres_notification_repo;
pub mod postgres_service_repo;
pub mod postgres_slot_repo;
pub mod postgres_user_repo;

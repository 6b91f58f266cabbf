use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, BookingRepository, NotificationRepository, ServiceRepository,
    SlotRepository, UserRepository,
};
use crate::domain::services::{auth_service::AuthService, booking_lifecycle::BookingPolicy};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub auth_service: Arc<AuthService>,
    pub policy: BookingPolicy,
}

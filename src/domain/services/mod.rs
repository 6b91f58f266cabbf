pub mod auth_service;
pub mod booking_lifecycle;
pub mod notifier;
pub mod slot_generator;
pub mod statistics;

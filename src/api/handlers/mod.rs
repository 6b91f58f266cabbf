pub mod auth;
pub mod booking;
pub mod health;
pub mod service;
pub mod slot;
pub mod user;

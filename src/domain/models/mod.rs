pub mod auth;
pub mod booking;
pub mod notification;
pub mod service;
pub mod slot;
pub mod statistics;
pub mod user;

use thiserror::Error;

/// A stored enum column held a value this build does not know.
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

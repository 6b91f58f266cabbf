use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    /// Minutes.
    pub duration: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(name: String, description: String, price: i64, duration: i32, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            price,
            duration,
            image_url,
            created_at: Utc::now(),
        }
    }
}

/// A master's own price for a service. At most one per (master, service).
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MasterServicePrice {
    pub master_id: String,
    pub service_id: String,
    pub price: i64,
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ServiceSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub service: Service,
    pub masters_count: i64,
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ServiceMaster {
    pub id: String,
    pub name: String,
    pub email: String,
    pub custom_price: i64,
    pub default_price: i64,
    pub total_bookings: i64,
}

/// The override wins whenever one exists.
pub fn effective_price(base_price: i64, override_price: Option<i64>) -> i64 {
    override_price.unwrap_or(base_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_price_supersedes_base() {
        assert_eq!(effective_price(1000, Some(800)), 800);
    }

    #[test]
    fn test_base_price_applies_without_override() {
        assert_eq!(effective_price(1000, None), 1000);
    }
}

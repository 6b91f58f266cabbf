use crate::domain::{
    models::service::{MasterServicePrice, Service, ServiceMaster, ServiceSummary},
    ports::ServiceRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresServiceRepo {
    pool: PgPool,
}

impl PostgresServiceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, name, description, price, duration, image_url, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
            .bind(&service.id).bind(&service.name).bind(&service.description).bind(service.price)
            .bind(service.duration).bind(&service.image_url).bind(service.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<ServiceSummary>, AppError> {
        sqlx::query_as::<_, ServiceSummary>(
            "SELECT s.id, s.name, s.description, s.price, s.duration, s.image_url, s.created_at,
                    COUNT(DISTINCT ms.master_id) AS masters_count
             FROM services s
             LEFT JOIN master_services ms ON s.id = ms.service_id
             GROUP BY s.id, s.name, s.description, s.price, s.duration, s.image_url, s.created_at
             ORDER BY s.name ASC"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_masters(&self, service_id: &str) -> Result<Vec<ServiceMaster>, AppError> {
        sqlx::query_as::<_, ServiceMaster>(
            "SELECT u.id, u.name, u.email, ms.price AS custom_price, s.price AS default_price,
                    COUNT(DISTINCT b.id) AS total_bookings
             FROM users u
             JOIN master_services ms ON u.id = ms.master_id
             JOIN services s ON ms.service_id = s.id
             LEFT JOIN bookings b ON u.id = b.master_id AND b.service_id = s.id
             WHERE ms.service_id = $1 AND u.role = 'master'
             GROUP BY u.id, u.name, u.email, ms.price, s.price
             ORDER BY u.name ASC"
        )
            .bind(service_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert_master_price(&self, price: &MasterServicePrice) -> Result<MasterServicePrice, AppError> {
        sqlx::query_as::<_, MasterServicePrice>(
            "INSERT INTO master_services (master_id, service_id, price) VALUES ($1, $2, $3)
             ON CONFLICT (master_id, service_id) DO UPDATE SET price = excluded.price
             RETURNING master_id, service_id, price"
        )
            .bind(&price.master_id).bind(&price.service_id).bind(price.price)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}

use crate::domain::{models::slot::{Slot, SlotView}, ports::SlotRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeSet;
use tracing::warn;

pub struct PostgresSlotRepo {
    pool: PgPool,
}

impl PostgresSlotRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for PostgresSlotRepo {
    async fn create_many(&self, slots: &[Slot]) -> Result<Vec<Slot>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut created = Vec::with_capacity(slots.len());

        // Generation is serialized per master; the overlap check below then sees every committed slot.
        let masters: BTreeSet<&str> = slots.iter().map(|s| s.master_id.as_str()).collect();
        for master_id in masters {
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
                .bind(master_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        for slot in slots {
            let clash: Option<String> = sqlx::query_scalar(
                "SELECT id FROM slots WHERE master_id = $1 AND date = $2 AND start_time < $3 AND end_time > $4 LIMIT 1"
            )
                .bind(&slot.master_id).bind(slot.date).bind(slot.end_time).bind(slot.start_time)
                .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

            if clash.is_some() {
                warn!("Slot generation rejected: {} {}-{} overlaps an existing slot", slot.date, slot.start_time, slot.end_time);
                return Err(AppError::Conflict(format!(
                    "Slot {} {}-{} overlaps an existing slot",
                    slot.date, slot.start_time.format("%H:%M"), slot.end_time.format("%H:%M")
                )));
            }

            let row = sqlx::query_as::<_, Slot>(
                "INSERT INTO slots (id, master_id, date, start_time, end_time, is_available, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING *"
            )
                .bind(&slot.id).bind(&slot.master_id).bind(slot.date).bind(slot.start_time)
                .bind(slot.end_time).bind(slot.is_available).bind(slot.created_at)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            created.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_master(&self, master_id: &str, date: Option<NaiveDate>) -> Result<Vec<SlotView>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT s.*, b.id AS booking_id, b.client_id, u.name AS client_name,
                    b.service_id, srv.name AS service_name, b.status
             FROM slots s
             LEFT JOIN bookings b ON s.id = b.slot_id AND b.status != 'cancelled'
             LEFT JOIN users u ON b.client_id = u.id
             LEFT JOIN services srv ON b.service_id = srv.id
             WHERE s.master_id = "
        );
        qb.push_bind(master_id);
        if let Some(date) = date {
            qb.push(" AND s.date = ").push_bind(date);
        }
        qb.push(" ORDER BY s.date ASC, s.start_time ASC");

        qb.build_query_as::<SlotView>()
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str, owner_id: Option<&str>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Booking creation locks the same row, so the active-booking check below stays valid until commit.
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let slot = match slot {
            Some(s) if owner_id.is_none_or(|owner| owner == s.master_id) => s,
            _ => return Err(AppError::NotFound("Slot not found".into())),
        };

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE slot_id = $1 AND status != 'cancelled'"
        )
            .bind(&slot.id).fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if active > 0 {
            return Err(AppError::Conflict("Cannot delete a slot with an active booking; cancel the booking first".into()));
        }

        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(&slot.id).execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}

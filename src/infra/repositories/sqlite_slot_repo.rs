use crate::domain::{models::slot::{Slot, SlotView}, ports::SlotRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn create_many(&self, slots: &[Slot]) -> Result<Vec<Slot>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut created = Vec::with_capacity(slots.len());

        // Each slot is inserted before its overlap check, so the transaction opens with a write.
        for slot in slots {
            let row = sqlx::query_as::<_, Slot>(
                "INSERT INTO slots (id, master_id, date, start_time, end_time, is_available, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING *"
            )
                .bind(&slot.id).bind(&slot.master_id).bind(slot.date).bind(slot.start_time)
                .bind(slot.end_time).bind(slot.is_available).bind(slot.created_at)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

            let clash: Option<String> = sqlx::query_scalar(
                "SELECT id FROM slots WHERE master_id = ? AND date = ? AND start_time < ? AND end_time > ? AND id != ? LIMIT 1"
            )
                .bind(&row.master_id).bind(row.date).bind(row.end_time).bind(row.start_time).bind(&row.id)
                .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

            if clash.is_some() {
                warn!("Slot generation rejected: {} {}-{} overlaps an existing slot", row.date, row.start_time, row.end_time);
                return Err(AppError::Conflict(format!(
                    "Slot {} {}-{} overlaps an existing slot",
                    row.date, row.start_time.format("%H:%M"), row.end_time.format("%H:%M")
                )));
            }
            created.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_master(&self, master_id: &str, date: Option<NaiveDate>) -> Result<Vec<SlotView>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
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
        // A single statement, so the booking check and the delete cannot interleave with a booking.
        let result = sqlx::query(
            "DELETE FROM slots
             WHERE id = ? AND (? IS NULL OR master_id = ?)
               AND NOT EXISTS (SELECT 1 FROM bookings WHERE slot_id = slots.id AND status != 'cancelled')"
        )
            .bind(id).bind(owner_id).bind(owner_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.find_by_id(id).await? {
            Some(slot) if owner_id.is_none_or(|owner| owner == slot.master_id) => {
                Err(AppError::Conflict("Cannot delete a slot with an active booking; cancel the booking first".into()))
            }
            _ => Err(AppError::NotFound("Slot not found".into())),
        }
    }
}

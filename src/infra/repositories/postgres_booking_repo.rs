use crate::domain::{
    models::{
        booking::{Booking, BookingStatus, BookingView, BookingWithSlot},
        service::effective_price,
        slot::Slot,
        statistics::StatBookingRow,
        user::{Identity, Role},
    },
    ports::BookingRepository,
    services::{
        booking_lifecycle::{apply, check_slot_claimable, BookingPolicy, Transition},
        notifier,
    },
};
use crate::error::AppError;
use crate::infra::repositories::postgres_notification_repo::emit;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};

const BOOKING_WITH_SLOT: &str =
    "SELECT b.*, s.date AS slot_date, s.start_time AS slot_start_time
     FROM bookings b
     LEFT JOIN slots s ON b.slot_id = s.id";

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Locks the slot row and takes it if it is free and belongs to `master_id`.
/// Competing transactions block on the row lock and then see it taken.
async fn claim_slot(conn: &mut PgConnection, slot_id: &str, master_id: &str) -> Result<Slot, AppError> {
    let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1 FOR UPDATE")
        .bind(slot_id)
        .fetch_optional(&mut *conn).await.map_err(AppError::Database)?;

    let slot = check_slot_claimable(slot.as_ref(), master_id)?.clone();

    sqlx::query("UPDATE slots SET is_available = FALSE WHERE id = $1")
        .bind(&slot.id).execute(&mut *conn).await.map_err(AppError::Database)?;
    Ok(slot)
}

async fn release_slot(conn: &mut PgConnection, slot_id: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE slots SET is_available = TRUE WHERE id = $1")
        .bind(slot_id).execute(conn).await.map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking, policy: &BookingPolicy) -> Result<Booking, AppError> {
        let slot_id = booking.slot_id.as_deref()
            .ok_or_else(|| AppError::Validation("A booking needs a slot".into()))?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let slot = claim_slot(&mut tx, slot_id, &booking.master_id).await.inspect_err(|_| {
            warn!("Booking rejected: slot {} is unavailable", slot_id);
        })?;
        policy.check_starts_in_future(slot.starts_at(), policy.now_local())?;

        let prices: Option<(i64, Option<i64>)> = sqlx::query_as(
            "SELECT s.price, ms.price
             FROM services s
             LEFT JOIN master_services ms ON s.id = ms.service_id AND ms.master_id = $1
             WHERE s.id = $2"
        )
            .bind(&booking.master_id).bind(&booking.service_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
        let (base, custom) = prices.ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, client_id, master_id, service_id, slot_id, price, notes, status, reminder_sent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.client_id).bind(&booking.master_id).bind(&booking.service_id)
            .bind(slot_id).bind(effective_price(base, custom)).bind(&booking.notes)
            .bind(booking.status.as_str()).bind(booking.reminder_sent)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        emit(&mut tx, &notifier::booking_created(&created.master_id, slot.starts_at())).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn confirm(&self, booking_id: &str, master_id: &str) -> Result<Booking, AppError> {
        let next = apply(BookingStatus::Pending, Transition::Confirm)?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, updated_at = $2
             WHERE id = $3 AND master_id = $4 AND status = 'pending'
             RETURNING *"
        )
            .bind(next.as_str()).bind(Utc::now()).bind(booking_id).bind(master_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found or already confirmed".into()))?;

        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        emit(&mut conn, &notifier::booking_confirmed(&updated.client_id)).await?;

        Ok(updated)
    }

    async fn cancel(&self, booking_id: &str, user_id: &str, policy: &BookingPolicy) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_as::<_, BookingWithSlot>(&format!(
            "{BOOKING_WITH_SLOT} WHERE b.id = $1 AND (b.client_id = $2 OR b.master_id = $2) FOR UPDATE OF b"
        ))
            .bind(booking_id).bind(user_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

        let next = apply(current.booking.status, Transition::Cancel)?;
        if let Some(start) = current.slot_start() {
            policy.check_cancellation_window(start, policy.now_local())?;
        }

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *"
        )
            .bind(next.as_str()).bind(Utc::now()).bind(booking_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if let Some(slot_id) = &updated.slot_id {
            release_slot(&mut tx, slot_id).await?;
        }

        let recipient = current.booking.counterparty_of(user_id);
        emit(&mut tx, &notifier::booking_cancelled(recipient, current.slot_start())).await?;

        tx.commit().await.map_err(AppError::Database)?;
        info!("Booking {} cancelled by {}", booking_id, user_id);
        Ok(updated)
    }

    async fn reschedule(&self, booking_id: &str, client_id: &str, new_slot_id: &str, policy: &BookingPolicy) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND client_id = $2 FOR UPDATE"
        )
            .bind(booking_id).bind(client_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
        let next = apply(current.status, Transition::Reschedule)?;

        let new_slot = claim_slot(&mut tx, new_slot_id, &current.master_id).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                warn!("Reschedule of {} rejected: slot {} is unavailable", booking_id, new_slot_id);
                AppError::Conflict("New slot unavailable".into())
            }
            other => other,
        })?;
        policy.check_starts_in_future(new_slot.starts_at(), policy.now_local())?;

        if let Some(old_slot_id) = &current.slot_id {
            release_slot(&mut tx, old_slot_id).await?;
        }

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET slot_id = $1, status = $2, reminder_sent = FALSE, updated_at = $3
             WHERE id = $4
             RETURNING *"
        )
            .bind(&new_slot.id).bind(next.as_str()).bind(Utc::now()).bind(booking_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        emit(&mut tx, &notifier::booking_rescheduled(&updated.master_id, new_slot.starts_at())).await?;

        tx.commit().await.map_err(AppError::Database)?;
        info!("Booking {} moved to slot {}", booking_id, new_slot.id);
        Ok(updated)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for(&self, who: &Identity) -> Result<Vec<BookingView>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT b.*, s.date, s.start_time, s.end_time,
                    srv.name AS service_name, srv.duration,
                    client.name AS client_name, client.email AS client_email, client.phone AS client_phone,
                    master.name AS master_name, master.email AS master_email
             FROM bookings b
             LEFT JOIN slots s ON b.slot_id = s.id
             JOIN services srv ON b.service_id = srv.id
             JOIN users client ON b.client_id = client.id
             JOIN users master ON b.master_id = master.id"
        );
        match who.role {
            Role::Client => { qb.push(" WHERE b.client_id = ").push_bind(&who.user_id); }
            Role::Master => { qb.push(" WHERE b.master_id = ").push_bind(&who.user_id); }
            Role::Admin => {}
        }
        qb.push(" ORDER BY s.date DESC, s.start_time DESC");

        qb.build_query_as::<BookingView>()
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_stat_rows(&self, master_id: &str) -> Result<Vec<StatBookingRow>, AppError> {
        sqlx::query_as::<_, StatBookingRow>(
            "SELECT b.status, b.price, b.client_id, b.service_id, srv.name AS service_name,
                    s.date, s.start_time
             FROM bookings b
             JOIN services srv ON b.service_id = srv.id
             LEFT JOIN slots s ON b.slot_id = s.id
             WHERE b.master_id = $1"
        )
            .bind(master_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn complete_elapsed(&self, now: NaiveDateTime) -> Result<u64, AppError> {
        let from = BookingStatus::Confirmed;
        let to = apply(from, Transition::Complete)?;

        let result = sqlx::query(
            "UPDATE bookings SET status = $1, updated_at = $2
             WHERE status = $3
               AND slot_id IN (SELECT id FROM slots WHERE date < $4 OR (date = $4 AND end_time <= $5))"
        )
            .bind(to.as_str()).bind(Utc::now()).bind(from.as_str())
            .bind(now.date()).bind(now.time())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn send_due_reminders(&self, now: NaiveDateTime, until: NaiveDateTime) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let due = sqlx::query_as::<_, BookingWithSlot>(&format!(
            "{BOOKING_WITH_SLOT}
             WHERE b.status IN ('pending', 'confirmed') AND b.reminder_sent = FALSE
               AND (s.date > $1 OR (s.date = $1 AND s.start_time > $2))
               AND (s.date < $3 OR (s.date = $3 AND s.start_time <= $4))
             FOR UPDATE OF b SKIP LOCKED"
        ))
            .bind(now.date()).bind(now.time()).bind(until.date()).bind(until.time())
            .fetch_all(&mut *tx).await.map_err(AppError::Database)?;

        for row in &due {
            let Some(start) = row.slot_start() else { continue };
            emit(&mut tx, &notifier::booking_reminder(&row.booking.client_id, start)).await?;
            sqlx::query("UPDATE bookings SET reminder_sent = TRUE WHERE id = $1")
                .bind(&row.booking.id).execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(due.len() as u64)
    }
}

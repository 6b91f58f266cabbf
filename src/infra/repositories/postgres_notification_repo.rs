use crate::domain::{models::notification::Notification, ports::NotificationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Writes the notification on the caller's connection so it commits or rolls
/// back with the transition that produced it.
pub(crate) async fn emit(conn: &mut PgConnection, n: &Notification) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, kind, title, message, is_read, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)"
    )
        .bind(&n.id).bind(&n.user_id).bind(n.kind.as_str()).bind(&n.title)
        .bind(&n.message).bind(n.is_read).bind(n.created_at)
        .execute(conn).await.map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepo {
    async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        )
            .bind(user_id).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_read(&self, user_id: &str, ids: &[String]) -> Result<u64, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE notifications SET is_read = TRUE WHERE user_id = ");
        qb.push_bind(user_id);
        qb.push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let result = qb.build().execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}

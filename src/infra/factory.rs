use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::ConnectOptions;
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;
use crate::domain::models::user::{Role, User};
use crate::domain::ports::UserRepository;
use crate::domain::services::{auth_service::{hash_password, AuthService}, booking_lifecycle::BookingPolicy};
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_notification_repo::PostgresNotificationRepo, postgres_service_repo::PostgresServiceRepo,
    postgres_slot_repo::PostgresSlotRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_notification_repo::SqliteNotificationRepo, sqlite_service_repo::SqliteServiceRepo,
    sqlite_slot_repo::SqliteSlotRepo, sqlite_user_repo::SqliteUserRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;
    let policy = BookingPolicy::new(config.business_timezone, config.cancellation_cutoff_hours);

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid Postgres URL: {}", e)))?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Postgres migrations failed: {}", e)))?;

        let auth_repo = Arc::new(PostgresAuthRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone())?);

        AppState {
            config: config.clone(),
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth_repo,
            service_repo: Arc::new(PostgresServiceRepo::new(pool.clone())),
            slot_repo: Arc::new(PostgresSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            notification_repo: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            auth_service,
            policy,
        }
    } else {
        info!("Initializing SQLite connection...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid SQLite connection string: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("SQLite migrations failed: {}", e)))?;

        let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone())?);

        AppState {
            config: config.clone(),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo,
            service_repo: Arc::new(SqliteServiceRepo::new(pool.clone())),
            slot_repo: Arc::new(SqliteSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            auth_service,
            policy,
        }
    };

    seed_admin(config, state.user_repo.as_ref()).await?;
    Ok(state)
}

/// Creates the initial admin account when `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set.
async fn seed_admin(config: &Config, users: &dyn UserRepository) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    if let Some(existing) = users.find_by_email(email).await? {
        if existing.role != Role::Admin {
            warn!("ADMIN_EMAIL {} belongs to a non-admin account; not seeding", existing.email);
        }
        return Ok(());
    }

    let admin = User::new(email.clone(), "Administrator".into(), None, hash_password(password)?, Role::Admin);
    users.create(&admin).await?;
    info!("Seeded admin account {}", admin.email);
    Ok(())
}

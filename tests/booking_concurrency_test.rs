use master_booking::{
    domain::models::{booking::{Booking, NewBookingParams}, service::Service, slot::Slot, user::{Role, User}},
    domain::ports::{BookingRepository, ServiceRepository, SlotRepository, UserRepository},
    domain::services::booking_lifecycle::BookingPolicy,
    error::AppError,
    infra::repositories::{
        postgres_booking_repo::PostgresBookingRepo,
        postgres_service_repo::PostgresServiceRepo,
        postgres_slot_repo::PostgresSlotRepo,
        postgres_user_repo::PostgresUserRepo,
    },
};
use chrono::{Duration, NaiveTime};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;

/// A migrated pool when `DATABASE_URL` targets Postgres.
async fn postgres_pool() -> Option<PgPool> {
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        println!("Skipping concurrency test (DATABASE_URL not set)");
        return None;
    };
    if !db_url.starts_with("postgres") {
        println!("Skipping concurrency test (not targeting Postgres)");
        return None;
    }

    let opts = PgConnectOptions::from_str(&db_url)
        .unwrap()
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect_with(opts)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!("./migrations/postgres").run(&pool).await.expect("Failed to migrate");
    Some(pool)
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn test_concurrent_bookings_claim_slot_once() {
    let Some(pool) = postgres_pool().await else { return };

    let users = PostgresUserRepo::new(pool.clone());
    let services = PostgresServiceRepo::new(pool.clone());
    let slots = PostgresSlotRepo::new(pool.clone());
    let repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
    let policy = BookingPolicy::new(chrono_tz::UTC, 24);

    let suffix = uuid::Uuid::new_v4();
    let master = users.create(&User::new(format!("master-{}@example.com", suffix), "Master".into(), None, "x".into(), Role::Master)).await.unwrap();
    let service = services.create(&Service::new(format!("Race {}", suffix), String::new(), 1000, 60, None)).await.unwrap();

    let date = policy.now_local().date() + Duration::days(3);
    let slot = slots.create_many(&[Slot::new(master.id.clone(), date, t(10, 0), t(10, 30))])
        .await.unwrap().remove(0);

    let contenders = 25;
    let mut client_ids = Vec::new();
    for i in 0..contenders {
        let client = users.create(&User::new(format!("client-{}-{}@example.com", i, suffix), "Client".into(), None, "x".into(), Role::Client)).await.unwrap();
        client_ids.push(client.id);
    }

    let mut set = JoinSet::new();
    for client_id in client_ids {
        let repo = repo.clone();
        let policy = policy.clone();
        let booking = Booking::new(NewBookingParams {
            client_id,
            master_id: master.id.clone(),
            service_id: service.id.clone(),
            slot_id: slot.id.clone(),
            notes: None,
        });
        set.spawn(async move { repo.create(&booking, &policy).await });
    }

    let mut won = 0;
    let mut conflicts = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    println!("Bookings won: {}, conflicts: {}", won, conflicts);

    assert_eq!(won, 1, "Slot was double booked. Race condition exists.");
    assert_eq!(conflicts, contenders - 1);

    let claimed = slots.find_by_id(&slot.id).await.unwrap().unwrap();
    assert!(!claimed.is_available);
}

#[tokio::test]
async fn test_concurrent_generation_never_overlaps() {
    let Some(pool) = postgres_pool().await else { return };

    let users = PostgresUserRepo::new(pool.clone());
    let repo = Arc::new(PostgresSlotRepo::new(pool.clone()));

    let suffix = uuid::Uuid::new_v4();
    let master = users.create(&User::new(format!("grid-{}@example.com", suffix), "Master".into(), None, "x".into(), Role::Master)).await.unwrap();
    let first_day = chrono::Utc::now().date_naive() + Duration::days(3);

    let rounds = 50;
    let mut both_ok = 0;
    for round in 0..rounds {
        let date = first_day + Duration::days(round);
        let on_hour = vec![Slot::new(master.id.clone(), date, t(9, 0), t(10, 0))];
        let half_past = vec![Slot::new(master.id.clone(), date, t(9, 30), t(10, 30))];

        let (a, b) = tokio::join!(repo.create_many(&on_hour), repo.create_many(&half_past));
        for res in [&a, &b] {
            if let Err(e) = res {
                assert!(matches!(e, AppError::Conflict(_)), "Unexpected error: {:?}", e);
            }
        }
        if a.is_ok() && b.is_ok() {
            both_ok += 1;
        }
    }

    let overlaps: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM slots a JOIN slots b
           ON a.master_id = b.master_id AND a.date = b.date AND a.id < b.id
          AND a.start_time < b.end_time AND b.start_time < a.end_time
         WHERE a.master_id = $1"
    )
        .bind(&master.id).fetch_one(&pool).await.unwrap();

    println!("Rounds: {}, both accepted: {}, overlapping pairs: {}", rounds, both_ok, overlaps);

    assert_eq!(both_ok, 0, "Two overlapping batches were both accepted");
    assert_eq!(overlaps, 0, "Overlapping slots stored for one master");
}

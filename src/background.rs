use std::sync::Arc;
use std::time::Duration;
use chrono::Duration as ChronoDuration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::error::AppError;

/// Reminders go out for bookings starting within this window.
pub const REMINDER_HORIZON_HOURS: i64 = 24;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background booking worker...");

    let interval = Duration::from_secs(state.config.worker_interval_secs.max(1));

    loop {
        let span = info_span!("booking_sweep");
        if let Err(e) = run_sweep(&state).instrument(span).await {
            error!("Booking sweep failed: {:?}", e);
        }
        sleep(interval).await;
    }
}

/// One pass: completes elapsed confirmed bookings, then sends due reminders.
/// Times are wall-clock in the business time zone, like slot times.
pub async fn run_sweep(state: &AppState) -> Result<(u64, u64), AppError> {
    let now = state.policy.now_local();

    let completed = state.booking_repo.complete_elapsed(now).await?;
    if completed > 0 {
        info!("Marked {} elapsed bookings as completed", completed);
    }

    let until = now + ChronoDuration::hours(REMINDER_HORIZON_HOURS);
    let reminded = state.booking_repo.send_due_reminders(now, until).await?;
    if reminded > 0 {
        info!("Sent {} booking reminders", reminded);
    }

    Ok((completed, reminded))
}

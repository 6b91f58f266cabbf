//! Rules of the booking state machine.
//!
//! ```text
//! pending   --confirm-->    confirmed
//! pending   --cancel-->     cancelled
//! confirmed --cancel-->     cancelled
//! pending   --reschedule--> pending
//! confirmed --reschedule--> pending
//! confirmed --complete-->   completed
//! ```
//!
//! `cancelled` and `completed` are terminal. The functions here are pure;
//! repositories call them while holding the relevant row locks so a decision
//! and the write it guards happen in one transaction.

use chrono::{Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use crate::domain::models::booking::BookingStatus;
use crate::domain::models::slot::Slot;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    Cancel,
    Reschedule,
    Complete,
}

impl Transition {
    fn verb(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Cancel => "cancel",
            Transition::Reschedule => "reschedule",
            Transition::Complete => "complete",
        }
    }
}

pub fn apply(from: BookingStatus, transition: Transition) -> Result<BookingStatus, AppError> {
    use BookingStatus::*;

    let to = match (from, transition) {
        (Pending, Transition::Confirm) => Confirmed,
        (Pending | Confirmed, Transition::Cancel) => Cancelled,
        (Pending | Confirmed, Transition::Reschedule) => Pending,
        (Confirmed, Transition::Complete) => Completed,
        _ => {
            return Err(AppError::Conflict(format!(
                "Cannot {} a booking that is {}", transition.verb(), from
            )));
        }
    };
    Ok(to)
}

/// Time-based booking rules, evaluated in the business time zone.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub timezone: Tz,
    pub cancellation_cutoff: Duration,
}

impl BookingPolicy {
    pub fn new(timezone: Tz, cancellation_cutoff_hours: i64) -> Self {
        Self {
            timezone,
            cancellation_cutoff: Duration::hours(cancellation_cutoff_hours),
        }
    }

    /// Current wall-clock time in the business zone, comparable with slot times.
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    /// Cancelling needs at least the cutoff between `now` and the slot start.
    /// A slot that has already started is always past the cutoff.
    pub fn check_cancellation_window(&self, slot_start: NaiveDateTime, now: NaiveDateTime) -> Result<(), AppError> {
        let remaining = slot_start - now;
        if remaining <= Duration::zero() {
            return Err(AppError::Policy("Cancellation window passed: the appointment has already started".into()));
        }
        if remaining < self.cancellation_cutoff {
            return Err(AppError::Policy(format!(
                "Cancellation window passed: bookings can be cancelled up to {} hours before the start",
                self.cancellation_cutoff.num_hours()
            )));
        }
        Ok(())
    }

    pub fn check_starts_in_future(&self, slot_start: NaiveDateTime, now: NaiveDateTime) -> Result<(), AppError> {
        if slot_start <= now {
            return Err(AppError::Policy("Cannot book a slot in the past".into()));
        }
        Ok(())
    }
}

/// A slot may be claimed when it is free and offered by the expected master.
pub fn check_slot_claimable<'a>(slot: Option<&'a Slot>, master_id: &str) -> Result<&'a Slot, AppError> {
    match slot {
        Some(s) if s.master_id == master_id && s.is_available => Ok(s),
        _ => Err(AppError::Conflict("Slot unavailable".into())),
    }
}

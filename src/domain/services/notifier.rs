use chrono::NaiveDateTime;
use crate::domain::models::notification::{Notification, NotificationKind};

pub fn booking_created(master_id: &str, slot_start: NaiveDateTime) -> Notification {
    Notification::new(
        master_id,
        NotificationKind::BookingCreated,
        "New booking",
        format!("You have a new booking on {}", fmt_start(slot_start)),
    )
}

pub fn booking_confirmed(client_id: &str) -> Notification {
    Notification::new(
        client_id,
        NotificationKind::BookingConfirmed,
        "Booking confirmed",
        "Your booking has been confirmed by the master",
    )
}

pub fn booking_cancelled(recipient_id: &str, slot_start: Option<NaiveDateTime>) -> Notification {
    let message = match slot_start {
        Some(start) => format!("The booking on {} has been cancelled", fmt_start(start)),
        None => "A booking has been cancelled".to_string(),
    };
    Notification::new(recipient_id, NotificationKind::BookingCancelled, "Booking cancelled", message)
}

pub fn booking_rescheduled(master_id: &str, new_start: NaiveDateTime) -> Notification {
    Notification::new(
        master_id,
        NotificationKind::BookingRescheduled,
        "Booking rescheduled",
        format!("A client moved their booking to {}", fmt_start(new_start)),
    )
}

pub fn booking_reminder(client_id: &str, slot_start: NaiveDateTime) -> Notification {
    Notification::new(
        client_id,
        NotificationKind::BookingReminder,
        "Upcoming appointment",
        format!("Reminder: your appointment starts on {}", fmt_start(slot_start)),
    )
}

fn fmt_start(start: NaiveDateTime) -> String {
    start.format("%Y-%m-%d %H:%M").to_string()
}

use chrono::{NaiveDate, NaiveTime, Timelike};
use crate::domain::models::slot::Slot;
use crate::error::AppError;

pub const DEFAULT_SLOT_DURATION_MIN: i64 = 60;
pub const MAX_GENERATION_DAYS: i64 = 31;

/// Splits `[start, end)` into back-to-back windows of `duration_min` minutes.
/// A trailing remainder shorter than `duration_min` is dropped.
pub fn split_day(start: NaiveTime, end: NaiveTime, duration_min: i64) -> Result<Vec<(NaiveTime, NaiveTime)>, AppError> {
    if duration_min <= 0 {
        return Err(AppError::Validation("Slot duration must be positive".into()));
    }
    if start >= end {
        return Err(AppError::Validation("Start time must be before end time".into()));
    }

    let start_min = minutes_of_day(start);
    let end_min = minutes_of_day(end);

    let mut windows = Vec::new();
    let mut cursor = start_min;
    while cursor + duration_min <= end_min {
        let from = time_from_minutes(cursor)?;
        let to = time_from_minutes(cursor + duration_min)?;
        windows.push((from, to));
        cursor += duration_min;
    }

    Ok(windows)
}

/// Every date from `first` through `last` inclusive.
pub fn date_range(first: NaiveDate, last: Option<NaiveDate>) -> Result<Vec<NaiveDate>, AppError> {
    let last = last.unwrap_or(first);
    if last < first {
        return Err(AppError::Validation("Range end date is before start date".into()));
    }
    let span = (last - first).num_days() + 1;
    if span > MAX_GENERATION_DAYS {
        return Err(AppError::Validation(format!("Cannot generate slots for more than {} days at once", MAX_GENERATION_DAYS)));
    }

    Ok(first.iter_days().take(span as usize).collect())
}

pub fn generate(
    master_id: &str,
    dates: &[NaiveDate],
    start: NaiveTime,
    end: NaiveTime,
    duration_min: i64,
) -> Result<Vec<Slot>, AppError> {
    let windows = split_day(start, end, duration_min)?;

    Ok(dates.iter()
        .flat_map(|date| windows.iter().map(move |(from, to)| Slot::new(master_id.to_string(), *date, *from, *to)))
        .collect())
}

fn minutes_of_day(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

fn time_from_minutes(total: i64) -> Result<NaiveTime, AppError> {
    NaiveTime::from_hms_opt((total / 60) as u32, (total % 60) as u32, 0)
        .ok_or(AppError::InternalWithMsg(format!("minute offset out of range: {}", total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_two_hour_window_yields_two_hourly_slots() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let slots = generate("7", &[date], t(9, 0), t(11, 0), 60).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!((slots[0].start_time, slots[0].end_time), (t(9, 0), t(10, 0)));
        assert_eq!((slots[1].start_time, slots[1].end_time), (t(10, 0), t(11, 0)));
        assert!(slots.iter().all(|s| s.is_available && s.master_id == "7" && s.date == date));
    }

    #[test]
    fn test_partial_trailing_interval_is_dropped() {
        let windows = split_day(t(9, 0), t(10, 50), 30).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows.last().unwrap().1, t(10, 30));
    }

    #[test]
    fn test_window_shorter_than_duration_yields_nothing() {
        assert!(split_day(t(9, 0), t(9, 45), 60).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_inverted_range_and_bad_duration() {
        assert!(matches!(split_day(t(11, 0), t(9, 0), 60), Err(AppError::Validation(_))));
        assert!(matches!(split_day(t(9, 0), t(9, 0), 60), Err(AppError::Validation(_))));
        assert!(matches!(split_day(t(9, 0), t(11, 0), 0), Err(AppError::Validation(_))));
        assert!(matches!(split_day(t(9, 0), t(11, 0), -15), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_date_range_is_inclusive_and_bounded() {
        let first = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let days = date_range(first, NaiveDate::from_ymd_opt(2025, 4, 12)).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(date_range(first, None).unwrap(), vec![first]);

        let too_far = first + chrono::Duration::days(MAX_GENERATION_DAYS);
        assert!(date_range(first, Some(too_far)).is_err());
        assert!(date_range(first, first.pred_opt()).is_err());
    }

    #[test]
    fn test_generation_across_days_keeps_slots_per_day() {
        let first = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let dates = date_range(first, first.succ_opt()).unwrap();
        let slots = generate("m", &dates, t(10, 0), t(12, 0), 60).unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots.iter().filter(|s| s.date == first).count(), 2);
    }
}

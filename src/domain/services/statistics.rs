use std::collections::{BTreeMap, HashMap, HashSet};
use chrono::{Datelike, Timelike};
use crate::domain::models::booking::BookingStatus;
use crate::domain::models::statistics::{
    GeneralStats, HourCount, MasterStatistics, ServiceStat, StatBookingRow, WeekdayCount,
};

const TOP_SERVICES: usize = 5;

/// Weekday, service and hour breakdowns count completed bookings only.
pub fn compute(rows: &[StatBookingRow]) -> MasterStatistics {
    let mut general = GeneralStats::default();
    let mut clients = HashSet::new();
    let mut by_day: BTreeMap<u32, i64> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, i64> = BTreeMap::new();
    let mut by_service: HashMap<&str, ServiceStat> = HashMap::new();

    for row in rows {
        clients.insert(row.client_id.as_str());

        match row.status {
            BookingStatus::Cancelled => general.cancelled_bookings += 1,
            BookingStatus::Pending | BookingStatus::Confirmed => general.upcoming_bookings += 1,
            BookingStatus::Completed => {
                general.completed_bookings += 1;
                general.total_revenue += row.price;

                if let Some(date) = row.date {
                    *by_day.entry(date.weekday().num_days_from_monday()).or_default() += 1;
                }
                if let Some(start) = row.start_time {
                    *by_hour.entry(start.hour()).or_default() += 1;
                }

                let stat = by_service.entry(row.service_id.as_str()).or_insert_with(|| ServiceStat {
                    service_id: row.service_id.clone(),
                    name: row.service_name.clone(),
                    bookings_count: 0,
                    revenue: 0,
                });
                stat.bookings_count += 1;
                stat.revenue += row.price;
            }
        }
    }
    general.unique_clients = clients.len() as i64;

    let mut popular_services: Vec<ServiceStat> = by_service.into_values().collect();
    popular_services.sort_by(|a, b| b.bookings_count.cmp(&a.bookings_count).then_with(|| a.name.cmp(&b.name)));
    popular_services.truncate(TOP_SERVICES);

    MasterStatistics {
        general,
        by_week_day: by_day.into_iter()
            .map(|(day, bookings_count)| WeekdayCount { day_name: weekday_name(day), bookings_count })
            .collect(),
        popular_services,
        by_hour: by_hour.into_iter()
            .map(|(hour, bookings_count)| HourCount { hour, bookings_count })
            .collect(),
    }
}

fn weekday_name(days_from_monday: u32) -> String {
    match days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn row(status: BookingStatus, client: &str, service: &str, price: i64, day: u32, hour: u32) -> StatBookingRow {
        StatBookingRow {
            status,
            price,
            client_id: client.into(),
            service_id: service.into(),
            service_name: format!("Service {}", service),
            date: NaiveDate::from_ymd_opt(2025, 4, day),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0),
        }
    }

    #[test]
    fn test_counts_and_revenue() {
        // 2025-04-07 is a Monday
        let rows = vec![
            row(BookingStatus::Completed, "c1", "s1", 1000, 7, 9),
            row(BookingStatus::Completed, "c2", "s1", 800, 7, 10),
            row(BookingStatus::Completed, "c1", "s2", 500, 8, 9),
            row(BookingStatus::Cancelled, "c3", "s1", 1000, 9, 9),
            row(BookingStatus::Pending, "c3", "s2", 500, 10, 11),
            row(BookingStatus::Confirmed, "c4", "s2", 500, 11, 12),
        ];

        let stats = compute(&rows);

        assert_eq!(stats.general, GeneralStats {
            completed_bookings: 3,
            cancelled_bookings: 1,
            upcoming_bookings: 2,
            total_revenue: 2300,
            unique_clients: 4,
        });

        assert_eq!(stats.by_week_day, vec![
            WeekdayCount { day_name: "Monday".into(), bookings_count: 2 },
            WeekdayCount { day_name: "Tuesday".into(), bookings_count: 1 },
        ]);
        assert_eq!(stats.by_hour, vec![
            HourCount { hour: 9, bookings_count: 2 },
            HourCount { hour: 10, bookings_count: 1 },
        ]);

        assert_eq!(stats.popular_services[0].service_id, "s1");
        assert_eq!(stats.popular_services[0].bookings_count, 2);
        assert_eq!(stats.popular_services[0].revenue, 1800);
    }

    #[test]
    fn test_empty_history() {
        let stats = compute(&[]);
        assert_eq!(stats.general, GeneralStats::default());
        assert!(stats.popular_services.is_empty());
    }
}

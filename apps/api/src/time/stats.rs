//! Time entry statistics: this-month totals, unbilled totals, and the
//! rolling 30-day windows the health score consumes.
//!
//! Window math is pure over a fetched slice of entries; the async
//! wrapper only does the fetching.

use chrono::{Days, NaiveDate};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::AppError;
use crate::health_score::inputs::{
    MonthStats, RollingWindow, TimeStats, UnbilledStats, WindowPair,
};
use crate::models::time_entry::TimeEntryRow;
use crate::targets::schedule::start_of_month;

/// Aggregates entries within the inclusive date range into one window.
pub fn window_stats(entries: &[TimeEntryRow], from: NaiveDate, to: NaiveDate) -> RollingWindow {
    let mut window = RollingWindow::default();
    let mut days = HashSet::new();

    for entry in entries {
        if entry.entry_date < from || entry.entry_date > to {
            continue;
        }

        window.total_hours += entry.hours;
        if entry.hours > 0.0 {
            days.insert(entry.entry_date);
        }

        if entry.billable {
            window.billable_hours += entry.hours;
            window.billable_revenue += entry.value();
            if !entry.invoiced {
                window.unbilled_hours += entry.hours;
                window.unbilled_value += entry.value();
            }
        } else {
            window.non_billable_hours += entry.hours;
        }
    }

    window.distinct_working_days = days.len() as u32;
    window.daily_hours = if window.distinct_working_days > 0 {
        window.total_hours / window.distinct_working_days as f64
    } else {
        0.0
    };

    window
}

/// Current window: today and the 29 days before it. Previous window:
/// the 30 days before that.
pub fn rolling_windows(entries: &[TimeEntryRow], today: NaiveDate) -> WindowPair<RollingWindow> {
    let current_from = today - Days::new(29);
    let previous_from = today - Days::new(59);
    let previous_to = today - Days::new(30);

    WindowPair {
        current: window_stats(entries, current_from, today),
        previous: window_stats(entries, previous_from, previous_to),
    }
}

pub fn month_stats(entries: &[TimeEntryRow], today: NaiveDate) -> MonthStats {
    let from = start_of_month(today);
    let window = window_stats(entries, from, today);

    MonthStats {
        hours: window.total_hours,
        revenue: window.billable_revenue,
        billable_hours: window.billable_hours,
        non_billable_hours: window.non_billable_hours,
        distinct_working_days: window.distinct_working_days,
    }
}

/// Totals over all billable, uninvoiced entries regardless of age.
pub fn unbilled_stats(entries: &[TimeEntryRow]) -> UnbilledStats {
    let mut stats = UnbilledStats::default();
    for entry in entries {
        if entry.billable && !entry.invoiced {
            stats.hours += entry.hours;
            stats.value += entry.value();
        }
    }
    stats
}

pub async fn fetch_time_stats(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<TimeStats, AppError> {
    let window_start = today - Days::new(59);
    let recent: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND entry_date >= $2 AND entry_date <= $3",
    )
    .bind(user_id)
    .bind(window_start)
    .bind(today)
    .fetch_all(pool)
    .await?;

    let unbilled: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND billable AND NOT invoiced",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(TimeStats {
        this_month: month_stats(&recent, today),
        unbilled: unbilled_stats(&unbilled),
        subscription: None,
        rolling_30_days: Some(rolling_windows(&recent, today)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(entry_date: NaiveDate, hours: f64, rate: f64, billable: bool, invoiced: bool) -> TimeEntryRow {
        TimeEntryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_id: Some(Uuid::new_v4()),
            project_name: None,
            description: "work".to_string(),
            entry_date,
            hours,
            hourly_rate: Some(rate),
            billable,
            invoiced,
            invoice_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_splits_billable_and_non_billable() {
        let today = date(2025, 9, 17);
        let entries = vec![
            entry(date(2025, 9, 10), 6.0, 80.0, true, false),
            entry(date(2025, 9, 10), 2.0, 0.0, false, false),
            entry(date(2025, 9, 11), 4.0, 80.0, true, true),
        ];

        let window = window_stats(&entries, today - Days::new(29), today);
        assert_eq!(window.total_hours, 12.0);
        assert_eq!(window.billable_hours, 10.0);
        assert_eq!(window.non_billable_hours, 2.0);
        assert_eq!(window.billable_revenue, 800.0);
        assert_eq!(window.unbilled_hours, 6.0);
        assert_eq!(window.unbilled_value, 480.0);
        assert_eq!(window.distinct_working_days, 2);
        assert_eq!(window.daily_hours, 6.0);
    }

    #[test]
    fn test_rolling_windows_partition_by_date() {
        let today = date(2025, 9, 17);
        let entries = vec![
            // Current window (within 29 days back).
            entry(today, 5.0, 100.0, true, false),
            entry(today - Days::new(29), 3.0, 100.0, true, false),
            // Previous window.
            entry(today - Days::new(30), 7.0, 100.0, true, false),
            entry(today - Days::new(59), 2.0, 100.0, true, false),
            // Outside both windows.
            entry(today - Days::new(60), 8.0, 100.0, true, false),
        ];

        let windows = rolling_windows(&entries, today);
        assert_eq!(windows.current.total_hours, 8.0);
        assert_eq!(windows.previous.total_hours, 9.0);
    }

    #[test]
    fn test_month_stats_starts_at_month_boundary() {
        let today = date(2025, 9, 10);
        let entries = vec![
            entry(date(2025, 9, 1), 4.0, 90.0, true, false),
            entry(date(2025, 8, 31), 6.0, 90.0, true, false),
        ];

        let stats = month_stats(&entries, today);
        assert_eq!(stats.hours, 4.0);
        assert_eq!(stats.revenue, 360.0);
    }

    #[test]
    fn test_unbilled_stats_ignores_invoiced_and_non_billable() {
        let entries = vec![
            entry(date(2025, 9, 1), 4.0, 90.0, true, false),
            entry(date(2025, 9, 2), 5.0, 90.0, true, true),
            entry(date(2025, 9, 3), 3.0, 90.0, false, false),
        ];

        let stats = unbilled_stats(&entries);
        assert_eq!(stats.hours, 4.0);
        assert_eq!(stats.value, 360.0);
    }

    #[test]
    fn test_empty_entries_yield_zero_windows() {
        let today = date(2025, 9, 17);
        let windows = rolling_windows(&[], today);
        assert_eq!(windows.current.total_hours, 0.0);
        assert_eq!(windows.current.daily_hours, 0.0);
        assert_eq!(windows.current.distinct_working_days, 0);
    }
}

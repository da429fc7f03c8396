//! Working-day schedule math.
//!
//! Targets are expressed as a set of ISO weekdays (1 = Monday, 7 =
//! Sunday). The daily hours target divides the monthly hours target over
//! the scheduled working days of that month.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

fn iso_weekday(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
        Weekday::Sun => 7,
    }
}

/// Number of scheduled working days in the inclusive date range.
pub fn expected_working_days(
    start: NaiveDate,
    end: NaiveDate,
    target_working_days: &[i32],
) -> u32 {
    if target_working_days.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut current = start;
    while current <= end {
        if target_working_days.contains(&iso_weekday(current)) {
            count += 1;
        }
        current = current + Days::new(1);
    }
    count
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month is valid")
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .expect("in-range month")
        - Days::new(1)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    end_of_month(date).day()
}

/// Target hours per working day for the month containing `month`.
/// Returns 0 when the schedule yields no working days.
pub fn daily_hours_target(
    monthly_hours_target: f64,
    target_working_days: &[i32],
    month: NaiveDate,
) -> f64 {
    let working_days = expected_working_days(
        start_of_month(month),
        end_of_month(month),
        target_working_days,
    );
    if working_days == 0 {
        return 0.0;
    }
    monthly_hours_target / working_days as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expected_working_days_mon_thu_week() {
        // Sept 1 2025 is a Monday; Sept 1-8 contains five Mon-Thu days.
        let count = expected_working_days(date(2025, 9, 1), date(2025, 9, 8), &[1, 2, 3, 4]);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_expected_working_days_full_month() {
        // September 2025 has 22 Mon-Fri days.
        let count =
            expected_working_days(date(2025, 9, 1), date(2025, 9, 30), &[1, 2, 3, 4, 5]);
        assert_eq!(count, 22);
    }

    #[test]
    fn test_empty_schedule_counts_zero() {
        assert_eq!(expected_working_days(date(2025, 9, 1), date(2025, 9, 30), &[]), 0);
    }

    #[test]
    fn test_month_window_helpers() {
        assert_eq!(start_of_month(date(2025, 9, 17)), date(2025, 9, 1));
        assert_eq!(end_of_month(date(2025, 9, 17)), date(2025, 9, 30));
        assert_eq!(end_of_month(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(days_in_month(date(2025, 2, 1)), 28);
    }

    #[test]
    fn test_daily_hours_target_divides_over_schedule() {
        // September 2025 has 18 Mon-Thu days: 120h / 18 = 6.67h/day.
        let target = daily_hours_target(120.0, &[1, 2, 3, 4], date(2025, 9, 1));
        assert!((target - 120.0 / 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_hours_target_empty_schedule_is_zero() {
        assert_eq!(daily_hours_target(120.0, &[], date(2025, 9, 1)), 0.0);
    }
}

//! Recurring expense projection.
//!
//! Projects future occurrences of recurring expense templates for cash
//! flow forecasting: schedule stepping per frequency (with day-of-month
//! clamping), compound annual amount escalation, and VAT derivation per
//! occurrence.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::models::recurring::{RecurrenceFrequency, RecurringTemplateRow};

/// Safety cap on schedule stepping for open-ended templates.
const MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseOccurrence {
    pub date: NaiveDate,
    pub amount: f64,
    pub gross_amount: f64,
    pub vat_amount: f64,
    pub deductible_vat_amount: f64,
    pub template_id: Uuid,
    pub template_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy)]
pub struct VatBreakdown {
    pub vat_amount: f64,
    pub gross_amount: f64,
    pub deductible_vat_amount: f64,
}

/// Summary of occurrences that are due (scheduled on or before today but
/// not yet posted). Consumed by the cash flow health penalty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DueSummary {
    pub total_count: usize,
    pub total_amount: f64,
    pub templates: Vec<DueTemplate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DueTemplate {
    pub template_id: Uuid,
    pub template_name: String,
    pub frequency: &'static str,
    pub occurrences_due: usize,
    pub total_amount: f64,
    pub next_occurrence_date: NaiveDate,
    pub last_occurrence_date: NaiveDate,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// VAT amounts for a net occurrence amount, honoring deductibility and
/// the business-use share of the expense.
pub fn vat_amounts(
    net_amount: f64,
    vat_rate: f64,
    is_vat_deductible: bool,
    business_use_percentage: f64,
) -> VatBreakdown {
    let vat_amount = round2(net_amount * (vat_rate / 100.0));
    let gross_amount = net_amount + vat_amount;
    let deductible_vat_amount = if is_vat_deductible {
        round2(vat_amount * (business_use_percentage / 100.0))
    } else {
        0.0
    };

    VatBreakdown {
        vat_amount,
        gross_amount,
        deductible_vat_amount,
    }
}

/// Applies compound annual escalation: the base amount grows by the
/// percentage once per whole year elapsed since the template start.
pub fn escalated_amount(
    base_amount: f64,
    escalation_percentage: Option<f64>,
    start_date: NaiveDate,
    on: NaiveDate,
) -> f64 {
    let pct = match escalation_percentage {
        Some(p) if p != 0.0 => p,
        _ => return base_amount,
    };

    let years_since_start = ((on - start_date).num_days() as f64 / 365.25).floor();
    if years_since_start <= 0.0 {
        return base_amount;
    }

    let multiplier = (1.0 + pct / 100.0).powf(years_since_start);
    round2(base_amount * multiplier)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let next = first
        .checked_add_months(Months::new(1))
        .expect("in-range month");
    (next - first).num_days() as u32
}

fn clamp_day(date: NaiveDate, day_of_month: i32) -> NaiveDate {
    let day = (day_of_month.max(1) as u32).min(days_in_month(date.year(), date.month()));
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).expect("clamped day is valid")
}

/// Steps a schedule date forward one period.
pub fn next_occurrence_after(
    current: NaiveDate,
    frequency: RecurrenceFrequency,
    day_of_month: Option<i32>,
) -> NaiveDate {
    match frequency {
        RecurrenceFrequency::Weekly => current + Days::new(7),
        RecurrenceFrequency::Monthly => {
            let next = current
                .checked_add_months(Months::new(1))
                .expect("in-range month");
            match day_of_month {
                Some(dom) => clamp_day(next, dom),
                None => next,
            }
        }
        RecurrenceFrequency::Quarterly => {
            let next = current
                .checked_add_months(Months::new(3))
                .expect("in-range month");
            match day_of_month {
                Some(dom) => clamp_day(next, dom),
                None => next,
            }
        }
        RecurrenceFrequency::Yearly => {
            let next = current
                .checked_add_months(Months::new(12))
                .expect("in-range year");
            match day_of_month {
                Some(dom) => clamp_day(next, dom),
                None => next,
            }
        }
    }
}

fn build_occurrence(
    template: &RecurringTemplateRow,
    date: NaiveDate,
    with_frequency_suffix: bool,
) -> ExpenseOccurrence {
    let amount = escalated_amount(
        template.amount,
        template.amount_escalation_percentage,
        template.start_date,
        date,
    );
    let vat = vat_amounts(
        amount,
        template.vat_rate,
        template.is_vat_deductible,
        template.business_use_percentage,
    );

    ExpenseOccurrence {
        date,
        amount,
        gross_amount: vat.gross_amount,
        vat_amount: vat.vat_amount,
        deductible_vat_amount: vat.deductible_vat_amount,
        template_id: template.id,
        template_name: template.name.clone(),
        description: if with_frequency_suffix {
            format!("{} ({})", template.name, template.frequency.as_str())
        } else {
            template.name.clone()
        },
    }
}

/// All occurrences of a template within `days_ahead` days from `from`.
/// A `next_occurrence` already in the past starts projecting from `from`.
pub fn occurrences_within(
    template: &RecurringTemplateRow,
    days_ahead: u64,
    from: NaiveDate,
) -> Vec<ExpenseOccurrence> {
    if !template.is_active {
        return vec![];
    }

    let horizon = from + Days::new(days_ahead);
    let mut current = template.next_occurrence.max(from);
    let mut occurrences = Vec::new();

    for _ in 0..MAX_ITERATIONS {
        if current > horizon {
            break;
        }
        if let Some(end) = template.end_date {
            if current > end {
                break;
            }
        }

        occurrences.push(build_occurrence(template, current, true));
        current = next_occurrence_after(current, template.frequency, template.day_of_month);
    }

    occurrences
}

/// Preview of the next `count` occurrences, starting at `next_occurrence`.
pub fn preview_occurrences(
    template: &RecurringTemplateRow,
    count: usize,
) -> Vec<ExpenseOccurrence> {
    if !template.is_active {
        return vec![];
    }

    let mut current = template.next_occurrence;
    let mut occurrences = Vec::new();

    for _ in 0..count {
        if let Some(end) = template.end_date {
            if current > end {
                break;
            }
        }
        occurrences.push(build_occurrence(template, current, false));
        current = next_occurrence_after(current, template.frequency, template.day_of_month);
    }

    occurrences
}

/// Occurrences scheduled on or before `today` that have not been posted
/// yet (the template's `next_occurrence` only advances when an
/// occurrence is posted as an expense).
pub fn due_occurrences(
    template: &RecurringTemplateRow,
    today: NaiveDate,
) -> Vec<ExpenseOccurrence> {
    if !template.is_active || template.next_occurrence > today {
        return vec![];
    }

    let mut current = template.next_occurrence;
    let mut occurrences = Vec::new();

    for _ in 0..MAX_ITERATIONS {
        if current > today {
            break;
        }
        if let Some(end) = template.end_date {
            if current > end {
                break;
            }
        }
        occurrences.push(build_occurrence(template, current, true));
        current = next_occurrence_after(current, template.frequency, template.day_of_month);
    }

    occurrences
}

/// Rolls the due occurrences of many templates into the summary shape
/// the health score consumes.
pub fn due_summary(templates: &[RecurringTemplateRow], today: NaiveDate) -> DueSummary {
    let mut summary = DueSummary::default();

    for template in templates {
        let due = due_occurrences(template, today);
        if due.is_empty() {
            continue;
        }

        let total: f64 = due.iter().map(|o| o.gross_amount).sum();
        summary.total_count += due.len();
        summary.total_amount += total;
        summary.templates.push(DueTemplate {
            template_id: template.id,
            template_name: template.name.clone(),
            frequency: template.frequency.as_str(),
            occurrences_due: due.len(),
            total_amount: total,
            next_occurrence_date: due.first().expect("non-empty").date,
            last_occurrence_date: due.last().expect("non-empty").date,
        });
    }

    summary
}

/// Annual gross cost of one template at its base amount.
pub fn annual_cost(template: &RecurringTemplateRow) -> f64 {
    let vat = vat_amounts(
        template.amount,
        template.vat_rate,
        template.is_vat_deductible,
        template.business_use_percentage,
    );
    vat.gross_amount * template.frequency.occurrences_per_year() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_template(frequency: RecurrenceFrequency) -> RecurringTemplateRow {
        RecurringTemplateRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Hosting".to_string(),
            amount: 100.0,
            frequency,
            start_date: date(2025, 1, 1),
            end_date: None,
            next_occurrence: date(2025, 1, 1),
            day_of_month: None,
            amount_escalation_percentage: None,
            is_active: true,
            vat_rate: 21.0,
            is_vat_deductible: true,
            business_use_percentage: 100.0,
            last_posted_on: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_weekly_steps_seven_days() {
        let next = next_occurrence_after(date(2025, 9, 1), RecurrenceFrequency::Weekly, None);
        assert_eq!(next, date(2025, 9, 8));
    }

    #[test]
    fn test_monthly_day_of_month_clamps_to_february() {
        let next =
            next_occurrence_after(date(2025, 1, 31), RecurrenceFrequency::Monthly, Some(31));
        assert_eq!(next, date(2025, 2, 28));

        // Leap year keeps the 29th.
        let next =
            next_occurrence_after(date(2024, 1, 31), RecurrenceFrequency::Monthly, Some(31));
        assert_eq!(next, date(2024, 2, 29));
    }

    #[test]
    fn test_monthly_without_day_of_month_keeps_day() {
        let next = next_occurrence_after(date(2025, 3, 15), RecurrenceFrequency::Monthly, None);
        assert_eq!(next, date(2025, 4, 15));
    }

    #[test]
    fn test_quarterly_and_yearly_stepping() {
        assert_eq!(
            next_occurrence_after(date(2025, 2, 10), RecurrenceFrequency::Quarterly, None),
            date(2025, 5, 10)
        );
        assert_eq!(
            next_occurrence_after(date(2025, 6, 30), RecurrenceFrequency::Yearly, None),
            date(2026, 6, 30)
        );
    }

    #[test]
    fn test_vat_amounts_standard_rate() {
        let vat = vat_amounts(100.0, 21.0, true, 100.0);
        assert_eq!(vat.vat_amount, 21.0);
        assert_eq!(vat.gross_amount, 121.0);
        assert_eq!(vat.deductible_vat_amount, 21.0);
    }

    #[test]
    fn test_vat_not_deductible_zeroes_deduction() {
        let vat = vat_amounts(100.0, 21.0, false, 100.0);
        assert_eq!(vat.deductible_vat_amount, 0.0);
        assert_eq!(vat.gross_amount, 121.0);
    }

    #[test]
    fn test_partial_business_use_scales_deductible_vat() {
        let vat = vat_amounts(100.0, 21.0, true, 50.0);
        assert_eq!(vat.deductible_vat_amount, 10.5);
    }

    #[test]
    fn test_escalation_compounds_per_whole_year() {
        let start = date(2023, 1, 1);
        // Within the first year: no escalation.
        assert_eq!(escalated_amount(100.0, Some(10.0), start, date(2023, 11, 1)), 100.0);
        // After one full year: one step.
        assert_eq!(escalated_amount(100.0, Some(10.0), start, date(2024, 2, 1)), 110.0);
        // After two full years: compounded.
        assert_eq!(escalated_amount(100.0, Some(10.0), start, date(2025, 2, 1)), 121.0);
    }

    #[test]
    fn test_escalation_absent_or_zero_is_identity() {
        let start = date(2020, 1, 1);
        assert_eq!(escalated_amount(100.0, None, start, date(2025, 1, 1)), 100.0);
        assert_eq!(escalated_amount(100.0, Some(0.0), start, date(2025, 1, 1)), 100.0);
    }

    #[test]
    fn test_inactive_template_projects_nothing() {
        let mut template = make_template(RecurrenceFrequency::Monthly);
        template.is_active = false;
        assert!(occurrences_within(&template, 365, date(2025, 1, 1)).is_empty());
        assert!(preview_occurrences(&template, 6).is_empty());
        assert!(due_occurrences(&template, date(2025, 6, 1)).is_empty());
    }

    #[test]
    fn test_occurrences_stop_at_end_date() {
        let mut template = make_template(RecurrenceFrequency::Monthly);
        template.end_date = Some(date(2025, 3, 15));
        let occurrences = occurrences_within(&template, 365, date(2025, 1, 1));
        let dates: Vec<_> = occurrences.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 2, 1), date(2025, 3, 1)]);
    }

    #[test]
    fn test_past_next_occurrence_projects_from_start_of_window() {
        let mut template = make_template(RecurrenceFrequency::Weekly);
        template.next_occurrence = date(2024, 12, 1);
        let occurrences = occurrences_within(&template, 14, date(2025, 6, 2));
        assert_eq!(occurrences.first().unwrap().date, date(2025, 6, 2));
    }

    #[test]
    fn test_preview_returns_requested_count() {
        let template = make_template(RecurrenceFrequency::Monthly);
        let occurrences = preview_occurrences(&template, 6);
        assert_eq!(occurrences.len(), 6);
        assert_eq!(occurrences[5].date, date(2025, 6, 1));
    }

    #[test]
    fn test_due_summary_accumulates_overdue_occurrences() {
        let mut a = make_template(RecurrenceFrequency::Monthly);
        a.next_occurrence = date(2025, 7, 1);
        let mut b = make_template(RecurrenceFrequency::Weekly);
        b.name = "Lease".to_string();
        b.next_occurrence = date(2025, 9, 20);

        let today = date(2025, 9, 5);
        let summary = due_summary(&[a, b], today);

        // Template a has July, August and September occurrences due;
        // template b's next occurrence is still in the future.
        assert_eq!(summary.templates.len(), 1);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.templates[0].next_occurrence_date, date(2025, 7, 1));
        assert_eq!(summary.templates[0].last_occurrence_date, date(2025, 9, 1));
        assert!((summary.total_amount - 3.0 * 121.0).abs() < 1e-9);
    }

    #[test]
    fn test_annual_cost_multiplies_gross_by_frequency() {
        let template = make_template(RecurrenceFrequency::Monthly);
        assert!((annual_cost(&template) - 121.0 * 12.0).abs() < 1e-9);
    }
}

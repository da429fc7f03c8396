//! Dashboard metrics: the invoice- and unbilled-work aggregates the
//! business health score consumes. The aggregation itself is pure; the
//! async wrapper fetches the rows.

use chrono::{Days, Months, NaiveDate};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::health_score::inputs::{DashboardMetrics, WindowPair};
use crate::models::client::{ClientRow, InvoicingFrequency};
use crate::models::invoice::{InvoiceRow, InvoiceStatus};
use crate::models::recurring::RecurringTemplateRow;
use crate::models::time_entry::TimeEntryRow;
use crate::recurring::calculator::due_summary;
use crate::targets::schedule::start_of_month;
use crate::time::status::invoice_readiness;

/// The date on which an uninvoiced entry became (or becomes) ready to
/// invoice under the client's frequency policy.
fn ready_since(entry_date: NaiveDate, frequency: InvoicingFrequency) -> NaiveDate {
    match frequency {
        InvoicingFrequency::OnDemand => entry_date,
        InvoicingFrequency::Weekly => entry_date + Days::new(7),
        InvoicingFrequency::Monthly => start_of_month(entry_date)
            .checked_add_months(Months::new(1))
            .expect("in-range month"),
    }
}

pub fn compute_dashboard_metrics(
    invoices: &[InvoiceRow],
    clients: &[ClientRow],
    unbilled_entries: &[TimeEntryRow],
    templates: &[RecurringTemplateRow],
    today: NaiveDate,
) -> DashboardMetrics {
    let mut metrics = DashboardMetrics::default();

    // Registered revenue and overdue aggregates.
    let mut oldest_overdue_days: Option<i64> = None;
    let current_from = today - Days::new(29);
    let previous_from = today - Days::new(59);
    let previous_to = today - Days::new(30);
    let mut rolling = WindowPair::<f64>::default();

    for invoice in invoices {
        if matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
            continue;
        }
        metrics.total_registered += invoice.total_amount;

        if invoice.invoice_date >= current_from && invoice.invoice_date <= today {
            rolling.current += invoice.total_amount;
        } else if invoice.invoice_date >= previous_from && invoice.invoice_date <= previous_to {
            rolling.previous += invoice.total_amount;
        }

        if invoice.is_overdue(today) {
            metrics.overdue_amount += invoice.outstanding();
            metrics.overdue_count += 1;
            let days = (today - invoice.due_date).num_days();
            oldest_overdue_days = Some(oldest_overdue_days.map_or(days, |d| d.max(days)));
        }
    }
    metrics.measured_dio = Some(oldest_overdue_days.unwrap_or(0) as f64);
    metrics.rolling_revenue = Some(rolling);

    // Ready-to-invoice work, classified per client frequency.
    let frequency_by_client: HashMap<Uuid, InvoicingFrequency> = clients
        .iter()
        .map(|c| (c.id, c.invoicing_frequency))
        .collect();

    let mut waiting_days_total = 0i64;
    let mut ready_count = 0u32;
    for entry in unbilled_entries {
        if !entry.billable || entry.invoiced {
            continue;
        }
        let frequency = entry
            .client_id
            .and_then(|id| frequency_by_client.get(&id).copied())
            .unwrap_or_default();
        if !invoice_readiness(entry.entry_date, frequency, today).ready {
            continue;
        }

        metrics.unbilled_value += entry.value();
        ready_count += 1;
        waiting_days_total += (today - ready_since(entry.entry_date, frequency)).num_days();
    }
    metrics.unbilled_count = ready_count;
    metrics.average_dri = Some(if ready_count > 0 {
        waiting_days_total as f64 / ready_count as f64
    } else {
        0.0
    });

    if !clients.is_empty() {
        metrics.average_payment_terms = Some(
            clients.iter().map(|c| c.default_payment_terms as f64).sum::<f64>()
                / clients.len() as f64,
        );
    }

    metrics.recurring_due = Some(due_summary(templates, today));
    metrics.last_recurring_registration =
        templates.iter().filter_map(|t| t.last_posted_on).max();

    metrics
}

pub async fn dashboard_metrics(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<DashboardMetrics, AppError> {
    let invoices: Vec<InvoiceRow> = sqlx::query_as("SELECT * FROM invoices WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let clients: Vec<ClientRow> = sqlx::query_as("SELECT * FROM clients WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let unbilled: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND billable AND NOT invoiced",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let templates: Vec<RecurringTemplateRow> = sqlx::query_as(
        "SELECT * FROM recurring_expense_templates WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(compute_dashboard_metrics(
        &invoices, &clients, &unbilled, &templates, today,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(
        status: InvoiceStatus,
        invoice_date: NaiveDate,
        due_date: NaiveDate,
        total: f64,
        paid: f64,
    ) -> InvoiceRow {
        InvoiceRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            invoice_number: "F-1".to_string(),
            invoice_date,
            due_date,
            status,
            subtotal: total / 1.21,
            vat_amount: total - total / 1.21,
            total_amount: total,
            paid_amount: paid,
            currency: "EUR".to_string(),
            reference: None,
            notes: None,
            sent_at: None,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn client(id: Uuid, frequency: InvoicingFrequency, terms: i32) -> ClientRow {
        ClientRow {
            id,
            user_id: Uuid::new_v4(),
            name: "Client".to_string(),
            company_name: None,
            email: None,
            phone: None,
            address: None,
            postal_code: None,
            city: None,
            country_code: "NL".to_string(),
            vat_number: None,
            is_business: true,
            is_supplier: false,
            default_payment_terms: terms,
            hourly_rate: None,
            invoicing_frequency: frequency,
            active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unbilled_entry(client_id: Uuid, entry_date: NaiveDate, hours: f64, rate: f64) -> TimeEntryRow {
        TimeEntryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_id: Some(client_id),
            project_name: None,
            description: "work".to_string(),
            entry_date,
            hours,
            hourly_rate: Some(rate),
            billable: true,
            invoiced: false,
            invoice_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_aggregates_and_dio() {
        let today = date(2025, 9, 17);
        let invoices = vec![
            invoice(InvoiceStatus::Sent, date(2025, 7, 1), date(2025, 7, 31), 1210.0, 0.0),
            invoice(InvoiceStatus::Partial, date(2025, 8, 1), date(2025, 8, 31), 605.0, 105.0),
            invoice(InvoiceStatus::Paid, date(2025, 8, 1), date(2025, 8, 15), 500.0, 500.0),
            invoice(InvoiceStatus::Draft, date(2025, 9, 1), date(2025, 9, 30), 999.0, 0.0),
        ];

        let metrics = compute_dashboard_metrics(&invoices, &[], &[], &[], today);
        assert_eq!(metrics.overdue_count, 2);
        assert!((metrics.overdue_amount - (1210.0 + 500.0)).abs() < 1e-9);
        // Oldest overdue invoice was due July 31: 48 days before Sept 17.
        assert_eq!(metrics.measured_dio, Some(48.0));
        // Draft excluded from registered revenue.
        assert!((metrics.total_registered - (1210.0 + 605.0 + 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ready_to_invoice_respects_frequency() {
        let today = date(2025, 9, 17);
        let on_demand = Uuid::new_v4();
        let monthly = Uuid::new_v4();
        let clients = vec![
            client(on_demand, InvoicingFrequency::OnDemand, 30),
            client(monthly, InvoicingFrequency::Monthly, 14),
        ];
        let entries = vec![
            // Ready immediately.
            unbilled_entry(on_demand, date(2025, 9, 15), 4.0, 100.0),
            // Same month under monthly invoicing: not ready yet.
            unbilled_entry(monthly, date(2025, 9, 10), 8.0, 100.0),
            // Previous month under monthly invoicing: ready since Sept 1.
            unbilled_entry(monthly, date(2025, 8, 20), 2.0, 100.0),
        ];

        let metrics = compute_dashboard_metrics(&[], &clients, &entries, &[], today);
        assert_eq!(metrics.unbilled_count, 2);
        assert!((metrics.unbilled_value - 600.0).abs() < 1e-9);
        // on-demand entry ready since Sept 15 (2 days), monthly since Sept 1 (16 days).
        assert_eq!(metrics.average_dri, Some(9.0));
        assert_eq!(metrics.average_payment_terms, Some(22.0));
    }

    #[test]
    fn test_rolling_revenue_windows() {
        let today = date(2025, 9, 17);
        let invoices = vec![
            invoice(InvoiceStatus::Sent, today - Days::new(5), today + Days::new(25), 1000.0, 0.0),
            invoice(InvoiceStatus::Paid, today - Days::new(40), today - Days::new(10), 700.0, 700.0),
        ];

        let metrics = compute_dashboard_metrics(&invoices, &[], &[], &[], today);
        let rolling = metrics.rolling_revenue.unwrap();
        assert_eq!(rolling.current, 1000.0);
        assert_eq!(rolling.previous, 700.0);
    }

    #[test]
    fn test_clean_account_yields_zeroes() {
        let metrics = compute_dashboard_metrics(&[], &[], &[], &[], date(2025, 9, 17));
        assert_eq!(metrics.overdue_count, 0);
        assert_eq!(metrics.measured_dio, Some(0.0));
        assert_eq!(metrics.average_dri, Some(0.0));
        assert!(metrics.average_payment_terms.is_none());
        assert!(metrics.last_recurring_registration.is_none());
    }
}

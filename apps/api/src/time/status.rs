//! Time entry status classification.
//!
//! Three mutually exclusive statuses, checked in order:
//! 1. `gefactureerd` (purple): already invoiced, edit prevention applies
//! 2. `niet-factureerbaar` (red): marked non-billable
//! 3. `factureerbaar`: billable and uninvoiced; green when the owning
//!    client's invoicing frequency says it is ready now, orange otherwise.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::client::{ClientRow, InvoicingFrequency};
use crate::models::time_entry::TimeEntryRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeEntryStatus {
    #[serde(rename = "gefactureerd")]
    Gefactureerd,
    #[serde(rename = "factureerbaar")]
    Factureerbaar,
    #[serde(rename = "niet-factureerbaar")]
    NietFactureerbaar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Red,
    Orange,
    Green,
    Purple,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryStatusInfo {
    pub status: TimeEntryStatus,
    pub label: &'static str,
    pub color: StatusColor,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct InvoiceReadiness {
    pub ready: bool,
    pub reason: String,
}

/// Checks whether an entry date meets the client's invoicing frequency
/// requirements as of `today`.
pub fn invoice_readiness(
    entry_date: NaiveDate,
    frequency: InvoicingFrequency,
    today: NaiveDate,
) -> InvoiceReadiness {
    match frequency {
        InvoicingFrequency::OnDemand => InvoiceReadiness {
            ready: true,
            reason: "Client invoices on demand - always ready".to_string(),
        },
        InvoicingFrequency::Weekly => {
            let days_old = (today - entry_date).num_days();
            if days_old >= 7 {
                InvoiceReadiness {
                    ready: true,
                    reason: format!("Weekly invoicing - entry is {days_old} days old"),
                }
            } else {
                InvoiceReadiness {
                    ready: false,
                    reason: format!("Weekly invoicing - {} days remaining", 7 - days_old),
                }
            }
        }
        InvoicingFrequency::Monthly => {
            let from_previous_month = entry_date.year() < today.year()
                || (entry_date.year() == today.year() && entry_date.month() < today.month());

            if from_previous_month {
                InvoiceReadiness {
                    ready: true,
                    reason: format!(
                        "Monthly invoicing - entry from {} {}",
                        month_name(entry_date.month()),
                        entry_date.year()
                    ),
                }
            } else {
                let (next_month, next_year) = if today.month() == 12 {
                    (1, today.year() + 1)
                } else {
                    (today.month() + 1, today.year())
                };
                InvoiceReadiness {
                    ready: false,
                    reason: format!(
                        "Monthly invoicing - will be billable in {} {}",
                        month_name(next_month),
                        next_year
                    ),
                }
            }
        }
    }
}

/// Determines the display status of a time entry based on business rules.
pub fn classify(
    billable: bool,
    invoiced: bool,
    invoice_id: Option<Uuid>,
    entry_date: NaiveDate,
    frequency: InvoicingFrequency,
    today: NaiveDate,
) -> TimeEntryStatusInfo {
    // Already invoiced wins over everything else (prevents editing).
    if invoiced || invoice_id.is_some() {
        return TimeEntryStatusInfo {
            status: TimeEntryStatus::Gefactureerd,
            label: "Invoiced",
            color: StatusColor::Purple,
            reason: match invoice_id {
                Some(id) => format!("Invoiced on invoice {id}"),
                None => "Already invoiced".to_string(),
            },
        };
    }

    if !billable {
        return TimeEntryStatusInfo {
            status: TimeEntryStatus::NietFactureerbaar,
            label: "Non-billable",
            color: StatusColor::Red,
            reason: "Marked as non-billable".to_string(),
        };
    }

    let readiness = invoice_readiness(entry_date, frequency, today);
    if readiness.ready {
        TimeEntryStatusInfo {
            status: TimeEntryStatus::Factureerbaar,
            label: "Billable",
            color: StatusColor::Green,
            reason: readiness.reason,
        }
    } else {
        TimeEntryStatusInfo {
            status: TimeEntryStatus::Factureerbaar,
            label: "Not yet billable",
            color: StatusColor::Orange,
            reason: readiness.reason,
        }
    }
}

pub fn classify_entry(
    entry: &TimeEntryRow,
    client: &ClientRow,
    today: NaiveDate,
) -> TimeEntryStatusInfo {
    classify(
        entry.billable,
        entry.invoiced,
        entry.invoice_id,
        entry.entry_date,
        client.invoicing_frequency,
        today,
    )
}

/// Summary counts of time entries by status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSummary {
    pub niet_factureerbaar: usize,
    pub factureerbaar: usize,
    pub gefactureerd: usize,
    pub totaal: usize,
}

pub fn summarize(
    entries: &[TimeEntryRow],
    client: &ClientRow,
    today: NaiveDate,
) -> StatusSummary {
    let mut summary = StatusSummary {
        totaal: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        match classify_entry(entry, client, today).status {
            TimeEntryStatus::NietFactureerbaar => summary.niet_factureerbaar += 1,
            TimeEntryStatus::Factureerbaar => summary.factureerbaar += 1,
            TimeEntryStatus::Gefactureerd => summary.gefactureerd += 1,
        }
    }

    summary
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_entry(
        billable: bool,
        invoiced: bool,
        invoice_id: Option<Uuid>,
        entry_date: NaiveDate,
    ) -> TimeEntryRow {
        TimeEntryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_id: Some(Uuid::new_v4()),
            project_name: None,
            description: "work".to_string(),
            entry_date,
            hours: 4.0,
            hourly_rate: Some(85.0),
            billable,
            invoiced,
            invoice_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_client(frequency: InvoicingFrequency) -> ClientRow {
        ClientRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Acme BV".to_string(),
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
            default_payment_terms: 30,
            hourly_rate: Some(85.0),
            invoicing_frequency: frequency,
            active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoiced_wins_over_all_other_flags() {
        let today = date(2025, 9, 17);
        // Even a non-billable entry shows as invoiced once the flag is set.
        let info = classify(
            false,
            true,
            None,
            date(2025, 9, 1),
            InvoicingFrequency::OnDemand,
            today,
        );
        assert_eq!(info.status, TimeEntryStatus::Gefactureerd);
        assert_eq!(info.color, StatusColor::Purple);
    }

    #[test]
    fn test_invoice_id_alone_marks_invoiced() {
        let today = date(2025, 9, 17);
        let id = Uuid::new_v4();
        let info = classify(
            true,
            false,
            Some(id),
            date(2025, 9, 1),
            InvoicingFrequency::OnDemand,
            today,
        );
        assert_eq!(info.status, TimeEntryStatus::Gefactureerd);
        assert!(info.reason.contains(&id.to_string()));
    }

    #[test]
    fn test_non_billable_is_red() {
        let today = date(2025, 9, 17);
        let info = classify(
            false,
            false,
            None,
            date(2025, 9, 1),
            InvoicingFrequency::OnDemand,
            today,
        );
        assert_eq!(info.status, TimeEntryStatus::NietFactureerbaar);
        assert_eq!(info.color, StatusColor::Red);
    }

    #[test]
    fn test_on_demand_is_always_green() {
        let today = date(2025, 9, 17);
        let info = classify(
            true,
            false,
            None,
            today,
            InvoicingFrequency::OnDemand,
            today,
        );
        assert_eq!(info.status, TimeEntryStatus::Factureerbaar);
        assert_eq!(info.color, StatusColor::Green);
    }

    #[test]
    fn test_weekly_boundary_at_seven_days() {
        let today = date(2025, 9, 17);
        let six_days = invoice_readiness(date(2025, 9, 11), InvoicingFrequency::Weekly, today);
        assert!(!six_days.ready);
        assert!(six_days.reason.contains("1 days remaining"));

        let seven_days = invoice_readiness(date(2025, 9, 10), InvoicingFrequency::Weekly, today);
        assert!(seven_days.ready);
    }

    #[test]
    fn test_weekly_not_ready_is_orange() {
        let today = date(2025, 9, 17);
        let info = classify(
            true,
            false,
            None,
            date(2025, 9, 15),
            InvoicingFrequency::Weekly,
            today,
        );
        assert_eq!(info.status, TimeEntryStatus::Factureerbaar);
        assert_eq!(info.color, StatusColor::Orange);
    }

    #[test]
    fn test_monthly_previous_month_is_ready() {
        let today = date(2025, 9, 17);
        let readiness = invoice_readiness(date(2025, 8, 31), InvoicingFrequency::Monthly, today);
        assert!(readiness.ready);
        assert!(readiness.reason.contains("August 2025"));
    }

    #[test]
    fn test_monthly_same_month_waits_for_next() {
        let today = date(2025, 9, 17);
        let readiness = invoice_readiness(date(2025, 9, 1), InvoicingFrequency::Monthly, today);
        assert!(!readiness.ready);
        assert!(readiness.reason.contains("October 2025"));
    }

    #[test]
    fn test_monthly_year_boundary() {
        let today = date(2026, 1, 5);
        // December of the previous year is ready in January.
        let readiness = invoice_readiness(date(2025, 12, 30), InvoicingFrequency::Monthly, today);
        assert!(readiness.ready);

        // A December entry in December rolls over to January of the next year.
        let december = date(2025, 12, 15);
        let readiness = invoice_readiness(december, InvoicingFrequency::Monthly, december);
        assert!(!readiness.ready);
        assert!(readiness.reason.contains("January 2026"));
    }

    #[test]
    fn test_summary_counts_by_status() {
        let today = date(2025, 9, 17);
        let client = make_client(InvoicingFrequency::OnDemand);
        let entries = vec![
            make_entry(true, false, None, date(2025, 9, 10)),
            make_entry(true, true, None, date(2025, 9, 10)),
            make_entry(false, false, None, date(2025, 9, 10)),
            make_entry(true, false, None, date(2025, 9, 12)),
        ];

        let summary = summarize(&entries, &client, today);
        assert_eq!(summary.totaal, 4);
        assert_eq!(summary.factureerbaar, 2);
        assert_eq!(summary.gefactureerd, 1);
        assert_eq!(summary.niet_factureerbaar, 1);
    }
}

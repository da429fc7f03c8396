use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Partial,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Legal status transitions. Drafts can be sent or cancelled; sent
    /// invoices move through payment states; paid and cancelled are terminal.
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Draft, Cancelled)
                | (Sent, Paid)
                | (Sent, Partial)
                | (Sent, Overdue)
                | (Sent, Cancelled)
                | (Partial, Paid)
                | (Partial, Overdue)
                | (Overdue, Paid)
                | (Overdue, Partial)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub subtotal: f64,
    pub vat_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub currency: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    /// Amount still owed on this invoice.
    pub fn outstanding(&self) -> f64 {
        (self.total_amount - self.paid_amount).max(0.0)
    }

    /// An invoice counts as overdue when it awaits payment past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Sent | InvoiceStatus::Partial | InvoiceStatus::Overdue
        ) && self.due_date < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_can_be_sent_or_cancelled() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Sent));
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
    }

    #[test]
    fn test_paid_is_terminal() {
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Sent));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Overdue));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Cancelled));
    }

    #[test]
    fn test_overdue_can_still_be_paid() {
        assert!(InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Partial));
        assert!(!InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Draft));
    }

    #[test]
    fn test_overdue_detection_respects_status_and_date() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        let mut invoice = InvoiceRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            invoice_number: "2025-001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            status: InvoiceStatus::Sent,
            subtotal: 1000.0,
            vat_amount: 210.0,
            total_amount: 1210.0,
            paid_amount: 0.0,
            currency: "EUR".to_string(),
            reference: None,
            notes: None,
            sent_at: None,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(invoice.is_overdue(today));

        invoice.status = InvoiceStatus::Paid;
        assert!(!invoice.is_overdue(today));

        invoice.status = InvoiceStatus::Sent;
        invoice.due_date = today;
        assert!(!invoice.is_overdue(today));
    }
}

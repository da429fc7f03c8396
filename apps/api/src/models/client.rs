use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How often a client expects to receive invoices. Drives the readiness
/// half of the time-entry status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "invoicing_frequency", rename_all = "snake_case")]
pub enum InvoicingFrequency {
    OnDemand,
    Weekly,
    Monthly,
}

impl Default for InvoicingFrequency {
    fn default() -> Self {
        InvoicingFrequency::OnDemand
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country_code: String,
    pub vat_number: Option<String>,
    pub is_business: bool,
    pub is_supplier: bool,
    pub default_payment_terms: i32,
    pub hourly_rate: Option<f64>,
    pub invoicing_frequency: InvoicingFrequency,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub description: String,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub hourly_rate: Option<f64>,
    pub billable: bool,
    pub invoiced: bool,
    pub invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntryRow {
    /// Billable value of this entry (hours times rate, 0 when no rate is set).
    pub fn value(&self) -> f64 {
        self.hours * self.hourly_rate.unwrap_or(0.0)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "recurrence_frequency", rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrenceFrequency {
    pub fn occurrences_per_year(self) -> u32 {
        match self {
            RecurrenceFrequency::Weekly => 52,
            RecurrenceFrequency::Monthly => 12,
            RecurrenceFrequency::Quarterly => 4,
            RecurrenceFrequency::Yearly => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Monthly => "monthly",
            RecurrenceFrequency::Quarterly => "quarterly",
            RecurrenceFrequency::Yearly => "yearly",
        }
    }
}

/// A schedule definition from which future expense occurrences are projected.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurringTemplateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub frequency: RecurrenceFrequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence: NaiveDate,
    pub day_of_month: Option<i32>,
    pub amount_escalation_percentage: Option<f64>,
    pub is_active: bool,
    pub vat_rate: f64,
    pub is_vat_deductible: bool,
    pub business_use_percentage: f64,
    pub last_posted_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

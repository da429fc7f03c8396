use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dutch ZZP expense deduction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "expense_category", rename_all = "snake_case")]
pub enum ExpenseCategory {
    Kantoorbenodigdheden,
    Reiskosten,
    MaaltijdenZakelijk,
    MarketingReclame,
    SoftwareIct,
    Afschrijvingen,
    Verzekeringen,
    ProfessioneleDiensten,
    WerkruimteKantoor,
    Voertuigkosten,
    TelefoonCommunicatie,
    Vakliteratuur,
    Werkkleding,
    RelatiegeschenkenRepresentatie,
    OverigeZakelijk,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expense_date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub total_amount: f64,
    pub is_deductible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Monthly profit targets, one row per user. The time-based pair
/// (hours target and hourly rate) is mandatory before the business
/// health dashboard unlocks; the subscription pair is optional.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfitTargetsRow {
    pub user_id: Uuid,
    pub monthly_revenue_target: f64,
    pub monthly_cost_target: f64,
    pub monthly_profit_target: f64,
    pub monthly_hours_target: f64,
    pub target_hourly_rate: f64,
    pub target_billable_ratio: f64,
    pub target_working_days: Vec<i32>,
    pub target_monthly_active_users: i32,
    pub target_avg_subscription_fee: f64,
    pub setup_completed: bool,
    pub last_vat_processed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

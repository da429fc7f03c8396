//! Input snapshot and output types for the business health score.
//!
//! The engine is a pure transformation over one `HealthScoreInputs`
//! value; every numeric field that may be unknown is optional and
//! degrades to 0, so partially-populated accounts never panic.
//!
//! Most metrics use a rolling 30-day window (today and the 29 days
//! before it) rather than month-to-date, so scores stay comparable on
//! any day of the month; the previous window (days 30-59 back) feeds
//! the trend penalties.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::targets::ProfitTargetsRow;
use crate::recurring::calculator::DueSummary;

/// A current/previous pair of rolling 30-day windows.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WindowPair<T> {
    pub current: T,
    pub previous: T,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardMetrics {
    /// Total registered (invoiced) revenue.
    #[serde(rename = "totale_registratie")]
    pub total_registered: f64,
    /// Outstanding overdue invoice amount.
    #[serde(rename = "achterstallig")]
    pub overdue_amount: f64,
    #[serde(rename = "achterstallig_count")]
    pub overdue_count: u32,
    /// Value of work that is ready to invoice now.
    #[serde(rename = "factureerbaar")]
    pub unbilled_value: f64,
    #[serde(rename = "factureerbaar_count")]
    pub unbilled_count: u32,
    /// Days the oldest overdue invoice is past its due date, when known.
    pub measured_dio: Option<f64>,
    pub average_payment_terms: Option<f64>,
    /// Average days ready-to-invoice work has been waiting.
    pub average_dri: Option<f64>,
    /// Invoiced revenue over the rolling windows.
    pub rolling_revenue: Option<WindowPair<f64>>,
    /// Most recent recurring-expense posting across all templates.
    pub last_recurring_registration: Option<NaiveDate>,
    pub recurring_due: Option<DueSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MonthStats {
    pub hours: f64,
    pub revenue: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    pub distinct_working_days: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct UnbilledStats {
    pub hours: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SubscriptionStats {
    pub monthly_active_users: f64,
    pub average_subscription_fee: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RollingWindow {
    pub billable_revenue: f64,
    pub distinct_working_days: u32,
    pub total_hours: f64,
    /// Average hours per distinct working day in the window.
    pub daily_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    pub unbilled_hours: f64,
    pub unbilled_value: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeStats {
    pub this_month: MonthStats,
    pub unbilled: UnbilledStats,
    pub subscription: Option<SubscriptionStats>,
    pub rolling_30_days: Option<WindowPair<RollingWindow>>,
}

/// Month-to-date pacing figures, kept for target progress display.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MtdCalculations {
    pub current_day: u32,
    pub days_in_month: u32,
    pub month_progress: f64,
    pub mtd_revenue_target: f64,
    pub mtd_hours_target: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetsSnapshot {
    pub monthly_revenue_target: f64,
    pub monthly_cost_target: f64,
    pub monthly_profit_target: f64,
    pub monthly_hours_target: f64,
    pub target_hourly_rate: f64,
    pub target_billable_ratio: f64,
    pub target_working_days: Vec<i32>,
    pub target_monthly_active_users: f64,
    pub target_avg_subscription_fee: f64,
    pub setup_completed: bool,
    pub last_vat_processed_on: Option<NaiveDate>,
}

impl From<&ProfitTargetsRow> for TargetsSnapshot {
    fn from(row: &ProfitTargetsRow) -> Self {
        TargetsSnapshot {
            monthly_revenue_target: row.monthly_revenue_target,
            monthly_cost_target: row.monthly_cost_target,
            monthly_profit_target: row.monthly_profit_target,
            monthly_hours_target: row.monthly_hours_target,
            target_hourly_rate: row.target_hourly_rate,
            target_billable_ratio: row.target_billable_ratio,
            target_working_days: row.target_working_days.clone(),
            target_monthly_active_users: row.target_monthly_active_users as f64,
            target_avg_subscription_fee: row.target_avg_subscription_fee,
            setup_completed: row.setup_completed,
            last_vat_processed_on: row.last_vat_processed_on,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopClient {
    pub name: String,
    /// Share of total revenue, in percent.
    pub revenue_share: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClientShareWindow {
    pub top_client_share: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientRevenueSnapshot {
    pub top_client: Option<TopClient>,
    pub rolling: Option<WindowPair<ClientShareWindow>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthScoreInputs {
    pub dashboard: DashboardMetrics,
    pub time_stats: TimeStats,
    pub mtd: MtdCalculations,
    pub profit_targets: Option<TargetsSnapshot>,
    pub client_revenue: Option<ClientRevenueSnapshot>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PillarScores {
    pub profit: f64,
    pub cashflow: f64,
    pub efficiency: f64,
    pub risk: f64,
    pub total: f64,
    pub total_rounded: i64,
}

/// One line of a pillar breakdown: the observed value, the points it
/// earned, and the formula text shown in the dashboard explanation.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreComponent {
    pub label: String,
    pub value: String,
    pub percentage: Option<String>,
    pub points: f64,
    pub max_points: f64,
    pub formula: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PenaltyLine {
    pub label: String,
    pub points: f64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PillarBreakdown {
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub components: Vec<ScoreComponent>,
    pub penalties: Vec<PenaltyLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn weight(self) -> f64 {
        match self {
            Priority::High => 3.0,
            Priority::Medium => 2.0,
            Priority::Low => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Immediate,
    Weekly,
    Monthly,
    Quarterly,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationMetrics {
    pub current: String,
    pub target: String,
    pub points_to_gain: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: &'static str,
    pub priority: Priority,
    /// Potential points to gain.
    pub impact: f64,
    pub effort: Effort,
    pub timeframe: Timeframe,
    pub title: String,
    pub description: String,
    pub action_items: Vec<String>,
    pub metrics: RecommendationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct PillarResult {
    pub score: f64,
    pub breakdown: PillarBreakdown,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub top_priorities: Vec<String>,
    pub quick_wins: Vec<String>,
    pub long_term_goals: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PillarBreakdowns {
    pub profit: PillarBreakdown,
    pub cashflow: PillarBreakdown,
    pub efficiency: PillarBreakdown,
    pub risk: PillarBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct PillarRecommendations {
    pub profit: Vec<Recommendation>,
    pub cashflow: Vec<Recommendation>,
    pub efficiency: Vec<Recommendation>,
    pub risk: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthScoreOutputs {
    pub scores: PillarScores,
    pub breakdown: PillarBreakdowns,
    pub recommendations: PillarRecommendations,
    pub insights: Insights,
}

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::targets::ProfitTargetsRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/profit-targets
pub async fn get_targets(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfitTargetsRow>, AppError> {
    let targets: Option<ProfitTargetsRow> =
        sqlx::query_as("SELECT * FROM profit_targets WHERE user_id = $1")
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;

    targets
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profit targets not configured".to_string()))
}

#[derive(Deserialize)]
pub struct UpsertTargetsRequest {
    pub user_id: Uuid,
    pub monthly_revenue_target: Option<f64>,
    pub monthly_cost_target: Option<f64>,
    pub monthly_profit_target: Option<f64>,
    pub monthly_hours_target: Option<f64>,
    pub target_hourly_rate: Option<f64>,
    pub target_billable_ratio: Option<f64>,
    pub target_working_days: Option<Vec<i32>>,
    pub target_monthly_active_users: Option<i32>,
    pub target_avg_subscription_fee: Option<f64>,
    pub setup_completed: Option<bool>,
    pub last_vat_processed_on: Option<NaiveDate>,
}

/// PUT /api/profit-targets (upsert, one row per user).
pub async fn upsert_targets(
    State(state): State<AppState>,
    Json(req): Json<UpsertTargetsRequest>,
) -> Result<Json<ProfitTargetsRow>, AppError> {
    let hours_target = req.monthly_hours_target.unwrap_or(0.0);
    let hourly_rate = req.target_hourly_rate.unwrap_or(0.0);
    let setup_completed = req.setup_completed.unwrap_or(false);

    // The dashboard gate requires the time-based pair; refuse marking
    // setup complete without it.
    if setup_completed && (hours_target <= 0.0 || hourly_rate <= 0.0) {
        return Err(AppError::Validation(
            "Setup requires a monthly hours target and a target hourly rate".to_string(),
        ));
    }

    let working_days = req.target_working_days.unwrap_or_else(|| vec![1, 2, 3, 4, 5]);
    if working_days.is_empty() || working_days.iter().any(|d| !(1..=7).contains(d)) {
        return Err(AppError::Validation(
            "target_working_days must be non-empty ISO weekdays (1-7)".to_string(),
        ));
    }

    let revenue_target = req.monthly_revenue_target.unwrap_or(hours_target * hourly_rate);
    let cost_target = req.monthly_cost_target.unwrap_or(0.0);
    let profit_target = req
        .monthly_profit_target
        .unwrap_or(revenue_target - cost_target);

    let targets: ProfitTargetsRow = sqlx::query_as(
        r#"
        INSERT INTO profit_targets
            (user_id, monthly_revenue_target, monthly_cost_target, monthly_profit_target,
             monthly_hours_target, target_hourly_rate, target_billable_ratio,
             target_working_days, target_monthly_active_users, target_avg_subscription_fee,
             setup_completed, last_vat_processed_on)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (user_id) DO UPDATE SET
            monthly_revenue_target = EXCLUDED.monthly_revenue_target,
            monthly_cost_target = EXCLUDED.monthly_cost_target,
            monthly_profit_target = EXCLUDED.monthly_profit_target,
            monthly_hours_target = EXCLUDED.monthly_hours_target,
            target_hourly_rate = EXCLUDED.target_hourly_rate,
            target_billable_ratio = EXCLUDED.target_billable_ratio,
            target_working_days = EXCLUDED.target_working_days,
            target_monthly_active_users = EXCLUDED.target_monthly_active_users,
            target_avg_subscription_fee = EXCLUDED.target_avg_subscription_fee,
            setup_completed = EXCLUDED.setup_completed,
            last_vat_processed_on = COALESCE(EXCLUDED.last_vat_processed_on, profit_targets.last_vat_processed_on),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(revenue_target)
    .bind(cost_target)
    .bind(profit_target)
    .bind(hours_target)
    .bind(hourly_rate)
    .bind(req.target_billable_ratio.unwrap_or(90.0))
    .bind(&working_days)
    .bind(req.target_monthly_active_users.unwrap_or(0))
    .bind(req.target_avg_subscription_fee.unwrap_or(0.0))
    .bind(setup_completed)
    .bind(req.last_vat_processed_on)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(targets))
}

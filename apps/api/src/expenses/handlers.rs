use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::expense::{ExpenseCategory, ExpenseRow};
use crate::state::AppState;
use crate::targets::schedule::start_of_month;

#[derive(Deserialize)]
pub struct ListExpensesQuery {
    pub user_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<ExpenseCategory>,
}

/// GET /api/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ListExpensesQuery>,
) -> Result<Json<Vec<ExpenseRow>>, AppError> {
    let expenses: Vec<ExpenseRow> = sqlx::query_as(
        r#"
        SELECT * FROM expenses
        WHERE user_id = $1
          AND ($2::date IS NULL OR expense_date >= $2)
          AND ($3::date IS NULL OR expense_date <= $3)
          AND ($4::expense_category IS NULL OR category = $4)
        ORDER BY expense_date DESC, created_at DESC
        "#,
    )
    .bind(params.user_id)
    .bind(params.from)
    .bind(params.to)
    .bind(params.category)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(expenses))
}

#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub user_id: Uuid,
    pub expense_date: Option<NaiveDate>,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub vat_rate: Option<f64>,
    pub is_deductible: Option<bool>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// POST /api/expenses
/// VAT and total amounts are derived from the net amount and rate.
pub async fn create_expense(
    State(state): State<AppState>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseRow>), AppError> {
    if !(req.amount > 0.0) {
        return Err(AppError::Validation("Amount must be greater than 0".to_string()));
    }

    let vat_rate = req.vat_rate.unwrap_or(0.21);
    let vat_amount = round2(req.amount * vat_rate);
    let total_amount = req.amount + vat_amount;

    let expense: ExpenseRow = sqlx::query_as(
        r#"
        INSERT INTO expenses
            (user_id, expense_date, description, category, amount, vat_rate,
             vat_amount, total_amount, is_deductible)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.expense_date.unwrap_or_else(|| Utc::now().date_naive()))
    .bind(req.description)
    .bind(req.category)
    .bind(req.amount)
    .bind(vat_rate)
    .bind(vat_amount)
    .bind(total_amount)
    .bind(req.is_deductible.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

#[derive(Deserialize)]
pub struct UpdateExpenseRequest {
    pub user_id: Uuid,
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<f64>,
    pub vat_rate: Option<f64>,
    pub is_deductible: Option<bool>,
}

/// PUT /api/expenses/:id
pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseRow>, AppError> {
    let existing: Option<ExpenseRow> =
        sqlx::query_as("SELECT * FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Expense {id} not found")))?;

    let amount = req.amount.unwrap_or(existing.amount);
    if !(amount > 0.0) {
        return Err(AppError::Validation("Amount must be greater than 0".to_string()));
    }
    let vat_rate = req.vat_rate.unwrap_or(existing.vat_rate);
    let vat_amount = round2(amount * vat_rate);
    let total_amount = amount + vat_amount;

    let expense: ExpenseRow = sqlx::query_as(
        r#"
        UPDATE expenses
        SET expense_date = $1, description = $2, category = $3, amount = $4,
            vat_rate = $5, vat_amount = $6, total_amount = $7, is_deductible = $8,
            updated_at = now()
        WHERE id = $9 AND user_id = $10
        RETURNING *
        "#,
    )
    .bind(req.expense_date.unwrap_or(existing.expense_date))
    .bind(req.description.unwrap_or(existing.description))
    .bind(req.category.unwrap_or(existing.category))
    .bind(amount)
    .bind(vat_rate)
    .bind(vat_amount)
    .bind(total_amount)
    .bind(req.is_deductible.unwrap_or(existing.is_deductible))
    .bind(id)
    .bind(req.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(expense))
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Expense {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ExpenseMetrics {
    pub this_month_total: f64,
    pub this_month_count: usize,
    pub rolling_30_days_total: f64,
    pub deductible_vat_total: f64,
    pub by_category: HashMap<ExpenseCategory, f64>,
}

/// GET /api/expenses/metrics
pub async fn expense_metrics(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ExpenseMetrics>, AppError> {
    let today = Utc::now().date_naive();
    let window_start = today - Days::new(29);
    let month_start = start_of_month(today);
    let fetch_from = month_start.min(window_start);

    let expenses: Vec<ExpenseRow> = sqlx::query_as(
        "SELECT * FROM expenses WHERE user_id = $1 AND expense_date >= $2 AND expense_date <= $3",
    )
    .bind(params.user_id)
    .bind(fetch_from)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    let mut metrics = ExpenseMetrics {
        this_month_total: 0.0,
        this_month_count: 0,
        rolling_30_days_total: 0.0,
        deductible_vat_total: 0.0,
        by_category: HashMap::new(),
    };

    for expense in &expenses {
        if expense.expense_date >= month_start {
            metrics.this_month_total += expense.total_amount;
            metrics.this_month_count += 1;
            *metrics.by_category.entry(expense.category).or_insert(0.0) += expense.total_amount;
            if expense.is_deductible {
                metrics.deductible_vat_total += expense.vat_amount;
            }
        }
        if expense.expense_date >= window_start {
            metrics.rolling_30_days_total += expense.total_amount;
        }
    }

    Ok(Json(metrics))
}

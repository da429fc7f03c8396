use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::expense::{ExpenseCategory, ExpenseRow};
use crate::models::recurring::{RecurrenceFrequency, RecurringTemplateRow};
use crate::state::AppState;

use super::calculator::{
    annual_cost, due_summary, escalated_amount, next_occurrence_after, occurrences_within,
    preview_occurrences, vat_amounts, DueSummary, ExpenseOccurrence,
};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(serde::Serialize)]
pub struct TemplateWithCost {
    #[serde(flatten)]
    pub template: RecurringTemplateRow,
    pub annual_cost: f64,
}

/// GET /api/recurring-expenses
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<TemplateWithCost>>, AppError> {
    let templates: Vec<RecurringTemplateRow> = sqlx::query_as(
        "SELECT * FROM recurring_expense_templates WHERE user_id = $1 ORDER BY name ASC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        templates
            .into_iter()
            .map(|template| TemplateWithCost {
                annual_cost: annual_cost(&template),
                template,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct CreateTemplateRequest {
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub frequency: RecurrenceFrequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<i32>,
    pub amount_escalation_percentage: Option<f64>,
    pub vat_rate: Option<f64>,
    pub is_vat_deductible: Option<bool>,
    pub business_use_percentage: Option<f64>,
}

fn validate_template(
    name: &str,
    amount: f64,
    day_of_month: Option<i32>,
    business_use: f64,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Template name is required".to_string()));
    }
    if !(amount > 0.0) {
        return Err(AppError::Validation("Amount must be greater than 0".to_string()));
    }
    if let Some(dom) = day_of_month {
        if !(1..=31).contains(&dom) {
            return Err(AppError::Validation(
                "day_of_month must be between 1 and 31".to_string(),
            ));
        }
    }
    if !(0.0..=100.0).contains(&business_use) {
        return Err(AppError::Validation(
            "business_use_percentage must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/recurring-expenses
pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<RecurringTemplateRow>), AppError> {
    let business_use = req.business_use_percentage.unwrap_or(100.0);
    validate_template(&req.name, req.amount, req.day_of_month, business_use)?;

    let template: RecurringTemplateRow = sqlx::query_as(
        r#"
        INSERT INTO recurring_expense_templates
            (user_id, name, amount, frequency, start_date, end_date, next_occurrence,
             day_of_month, amount_escalation_percentage, vat_rate, is_vat_deductible,
             business_use_percentage)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.name.trim())
    .bind(req.amount)
    .bind(req.frequency)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.start_date) // first occurrence is the start date
    .bind(req.day_of_month)
    .bind(req.amount_escalation_percentage)
    .bind(req.vat_rate.unwrap_or(21.0))
    .bind(req.is_vat_deductible.unwrap_or(true))
    .bind(business_use)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

#[derive(Deserialize)]
pub struct UpdateTemplateRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub frequency: Option<RecurrenceFrequency>,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence: Option<NaiveDate>,
    pub day_of_month: Option<i32>,
    pub amount_escalation_percentage: Option<f64>,
    pub is_active: Option<bool>,
    pub vat_rate: Option<f64>,
    pub is_vat_deductible: Option<bool>,
    pub business_use_percentage: Option<f64>,
}

/// PUT /api/recurring-expenses/:id
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<RecurringTemplateRow>, AppError> {
    let existing: Option<RecurringTemplateRow> =
        sqlx::query_as("SELECT * FROM recurring_expense_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    let name = req.name.unwrap_or(existing.name);
    let amount = req.amount.unwrap_or(existing.amount);
    let day_of_month = req.day_of_month.or(existing.day_of_month);
    let business_use = req
        .business_use_percentage
        .unwrap_or(existing.business_use_percentage);
    validate_template(&name, amount, day_of_month, business_use)?;

    let template: RecurringTemplateRow = sqlx::query_as(
        r#"
        UPDATE recurring_expense_templates
        SET name = $1, amount = $2, frequency = $3, end_date = $4, next_occurrence = $5,
            day_of_month = $6, amount_escalation_percentage = $7, is_active = $8,
            vat_rate = $9, is_vat_deductible = $10, business_use_percentage = $11,
            updated_at = now()
        WHERE id = $12 AND user_id = $13
        RETURNING *
        "#,
    )
    .bind(name.trim())
    .bind(amount)
    .bind(req.frequency.unwrap_or(existing.frequency))
    .bind(req.end_date.or(existing.end_date))
    .bind(req.next_occurrence.unwrap_or(existing.next_occurrence))
    .bind(day_of_month)
    .bind(req.amount_escalation_percentage.or(existing.amount_escalation_percentage))
    .bind(req.is_active.unwrap_or(existing.is_active))
    .bind(req.vat_rate.unwrap_or(existing.vat_rate))
    .bind(req.is_vat_deductible.unwrap_or(existing.is_vat_deductible))
    .bind(business_use)
    .bind(id)
    .bind(req.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(template))
}

/// DELETE /api/recurring-expenses/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result =
        sqlx::query("DELETE FROM recurring_expense_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Template {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    pub user_id: Uuid,
    pub count: Option<usize>,
}

/// GET /api/recurring-expenses/:id/preview
pub async fn preview_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PreviewQuery>,
) -> Result<Json<Vec<ExpenseOccurrence>>, AppError> {
    let template: Option<RecurringTemplateRow> =
        sqlx::query_as("SELECT * FROM recurring_expense_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;
    let template =
        template.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    let count = params.count.unwrap_or(6).clamp(1, 36);
    Ok(Json(preview_occurrences(&template, count)))
}

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub user_id: Uuid,
    pub days: Option<u64>,
}

#[derive(serde::Serialize)]
pub struct ForecastResponse {
    pub days_ahead: u64,
    pub total: f64,
    pub occurrences: Vec<ExpenseOccurrence>,
}

/// GET /api/recurring-expenses/forecast
/// Projected outflows over the coming horizon for cashflow planning.
pub async fn forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, AppError> {
    let templates: Vec<RecurringTemplateRow> = sqlx::query_as(
        "SELECT * FROM recurring_expense_templates WHERE user_id = $1 AND is_active",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    let days_ahead = params.days.unwrap_or(90).clamp(1, 730);
    let today = Utc::now().date_naive();

    let mut occurrences: Vec<ExpenseOccurrence> = templates
        .iter()
        .flat_map(|t| occurrences_within(t, days_ahead, today))
        .collect();
    occurrences.sort_by_key(|o| o.date);

    Ok(Json(ForecastResponse {
        days_ahead,
        total: occurrences.iter().map(|o| o.gross_amount).sum(),
        occurrences,
    }))
}

/// GET /api/recurring-expenses/due
pub async fn due_occurrences(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DueSummary>, AppError> {
    let templates: Vec<RecurringTemplateRow> = sqlx::query_as(
        "SELECT * FROM recurring_expense_templates WHERE user_id = $1 AND is_active",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(due_summary(&templates, Utc::now().date_naive())))
}

#[derive(Deserialize)]
pub struct PostOccurrenceRequest {
    pub user_id: Uuid,
    pub category: Option<ExpenseCategory>,
}

/// POST /api/recurring-expenses/:id/post
/// Records the template's next due occurrence as a real expense and
/// advances the schedule past it.
pub async fn post_occurrence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostOccurrenceRequest>,
) -> Result<(StatusCode, Json<ExpenseRow>), AppError> {
    let template: Option<RecurringTemplateRow> =
        sqlx::query_as("SELECT * FROM recurring_expense_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let template =
        template.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    if !template.is_active {
        return Err(AppError::UnprocessableEntity(
            "Template is not active".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let occurrence_date = template.next_occurrence;
    if occurrence_date > today {
        return Err(AppError::UnprocessableEntity(format!(
            "Next occurrence {occurrence_date} is not due yet"
        )));
    }

    let amount = escalated_amount(
        template.amount,
        template.amount_escalation_percentage,
        template.start_date,
        occurrence_date,
    );
    // Template VAT rates are percentages (21.0); expense rows store fractions (0.21).
    let vat = vat_amounts(
        amount,
        template.vat_rate,
        template.is_vat_deductible,
        template.business_use_percentage,
    );

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
    .bind(occurrence_date)
    .bind(format!("{} ({})", template.name, template.frequency.as_str()))
    .bind(req.category.unwrap_or(ExpenseCategory::OverigeZakelijk))
    .bind(amount)
    .bind(template.vat_rate / 100.0)
    .bind(vat.vat_amount)
    .bind(vat.gross_amount)
    .bind(template.is_vat_deductible)
    .fetch_one(&state.db)
    .await?;

    let next = next_occurrence_after(occurrence_date, template.frequency, template.day_of_month);
    sqlx::query(
        r#"
        UPDATE recurring_expense_templates
        SET next_occurrence = $1, last_posted_on = $2, updated_at = now()
        WHERE id = $3 AND user_id = $4
        "#,
    )
    .bind(next)
    .bind(occurrence_date)
    .bind(id)
    .bind(req.user_id)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

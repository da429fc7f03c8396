use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::client::ClientRow;
use crate::models::time_entry::TimeEntryRow;
use crate::state::AppState;

use super::stats::fetch_time_stats;
use super::status::{classify, summarize, StatusSummary, TimeEntryStatusInfo};

/// A time entry decorated with its display status, the shape list
/// endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryWithStatus {
    #[serde(flatten)]
    pub entry: TimeEntryRow,
    pub status: TimeEntryStatusInfo,
}

async fn load_client(
    state: &AppState,
    user_id: Uuid,
    client_id: Option<Uuid>,
) -> Result<Option<ClientRow>, AppError> {
    let Some(client_id) = client_id else {
        return Ok(None);
    };
    let client: Option<ClientRow> =
        sqlx::query_as("SELECT * FROM clients WHERE id = $1 AND user_id = $2")
            .bind(client_id)
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;
    Ok(client)
}

async fn decorate(
    state: &AppState,
    user_id: Uuid,
    entries: Vec<TimeEntryRow>,
    today: NaiveDate,
) -> Result<Vec<TimeEntryWithStatus>, AppError> {
    let clients: Vec<ClientRow> = sqlx::query_as("SELECT * FROM clients WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&state.db)
        .await?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let frequency = entry
                .client_id
                .and_then(|id| clients.iter().find(|c| c.id == id))
                .map(|c| c.invoicing_frequency)
                .unwrap_or_default();
            let status = classify(
                entry.billable,
                entry.invoiced,
                entry.invoice_id,
                entry.entry_date,
                frequency,
                today,
            );
            TimeEntryWithStatus { entry, status }
        })
        .collect())
}

#[derive(Deserialize)]
pub struct ListTimeEntriesQuery {
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/time-entries
pub async fn list_time_entries(
    State(state): State<AppState>,
    Query(params): Query<ListTimeEntriesQuery>,
) -> Result<Json<Vec<TimeEntryWithStatus>>, AppError> {
    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        r#"
        SELECT * FROM time_entries
        WHERE user_id = $1
          AND ($2::uuid IS NULL OR client_id = $2)
          AND ($3::date IS NULL OR entry_date >= $3)
          AND ($4::date IS NULL OR entry_date <= $4)
        ORDER BY entry_date DESC, created_at DESC
        "#,
    )
    .bind(params.user_id)
    .bind(params.client_id)
    .bind(params.from)
    .bind(params.to)
    .fetch_all(&state.db)
    .await?;

    let today = Utc::now().date_naive();
    Ok(Json(decorate(&state, params.user_id, entries, today).await?))
}

#[derive(Deserialize)]
pub struct CreateTimeEntryRequest {
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub description: String,
    pub entry_date: Option<NaiveDate>,
    pub hours: f64,
    pub hourly_rate: Option<f64>,
    pub billable: Option<bool>,
}

fn validate_hours(hours: f64) -> Result<(), AppError> {
    if !(hours > 0.0) {
        return Err(AppError::Validation("Hours must be greater than 0".to_string()));
    }
    if hours > 24.0 {
        return Err(AppError::Validation("Hours cannot exceed 24 per entry".to_string()));
    }
    Ok(())
}

/// POST /api/time-entries
pub async fn create_time_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateTimeEntryRequest>,
) -> Result<(StatusCode, Json<TimeEntryRow>), AppError> {
    validate_hours(req.hours)?;

    let client = load_client(&state, req.user_id, req.client_id).await?;
    if let Some(client_id) = req.client_id {
        if client.is_none() {
            return Err(AppError::NotFound(format!("Client {client_id} not found")));
        }
    }

    // Rate falls back to the client's default when not given.
    let hourly_rate = req
        .hourly_rate
        .or_else(|| client.as_ref().and_then(|c| c.hourly_rate));

    let entry: TimeEntryRow = sqlx::query_as(
        r#"
        INSERT INTO time_entries
            (user_id, client_id, project_name, description, entry_date, hours,
             hourly_rate, billable)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.client_id)
    .bind(req.project_name)
    .bind(req.description)
    .bind(req.entry_date.unwrap_or_else(|| Utc::now().date_naive()))
    .bind(req.hours)
    .bind(hourly_rate)
    .bind(req.billable.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Deserialize)]
pub struct UpdateTimeEntryRequest {
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub billable: Option<bool>,
}

/// PUT /api/time-entries/:id
/// Invoiced entries are locked against edits.
pub async fn update_time_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTimeEntryRequest>,
) -> Result<Json<TimeEntryRow>, AppError> {
    let existing: Option<TimeEntryRow> =
        sqlx::query_as("SELECT * FROM time_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Time entry {id} not found")))?;

    if existing.invoiced || existing.invoice_id.is_some() {
        return Err(AppError::UnprocessableEntity(
            "Invoiced time entries cannot be edited".to_string(),
        ));
    }

    let hours = req.hours.unwrap_or(existing.hours);
    validate_hours(hours)?;

    let entry: TimeEntryRow = sqlx::query_as(
        r#"
        UPDATE time_entries
        SET client_id = $1, project_name = $2, description = $3, entry_date = $4,
            hours = $5, hourly_rate = $6, billable = $7, updated_at = now()
        WHERE id = $8 AND user_id = $9
        RETURNING *
        "#,
    )
    .bind(req.client_id.or(existing.client_id))
    .bind(req.project_name.or(existing.project_name))
    .bind(req.description.unwrap_or(existing.description))
    .bind(req.entry_date.unwrap_or(existing.entry_date))
    .bind(hours)
    .bind(req.hourly_rate.or(existing.hourly_rate))
    .bind(req.billable.unwrap_or(existing.billable))
    .bind(id)
    .bind(req.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// DELETE /api/time-entries/:id
pub async fn delete_time_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let existing: Option<TimeEntryRow> =
        sqlx::query_as("SELECT * FROM time_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Time entry {id} not found")))?;

    if existing.invoiced || existing.invoice_id.is_some() {
        return Err(AppError::UnprocessableEntity(
            "Invoiced time entries cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM time_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/time-entries/today
pub async fn today_entries(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<TimeEntryWithStatus>>, AppError> {
    let today = Utc::now().date_naive();
    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND entry_date = $2 ORDER BY created_at ASC",
    )
    .bind(params.user_id)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(decorate(&state, params.user_id, entries, today).await?))
}

#[derive(Deserialize)]
pub struct UnbilledQuery {
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
}

/// GET /api/time-entries/unbilled
/// Billable, uninvoiced entries that are ready to invoice now.
pub async fn unbilled_entries(
    State(state): State<AppState>,
    Query(params): Query<UnbilledQuery>,
) -> Result<Json<Vec<TimeEntryWithStatus>>, AppError> {
    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        r#"
        SELECT * FROM time_entries
        WHERE user_id = $1 AND billable AND NOT invoiced
          AND ($2::uuid IS NULL OR client_id = $2)
        ORDER BY entry_date ASC
        "#,
    )
    .bind(params.user_id)
    .bind(params.client_id)
    .fetch_all(&state.db)
    .await?;

    let today = Utc::now().date_naive();
    let decorated = decorate(&state, params.user_id, entries, today).await?;
    let ready: Vec<TimeEntryWithStatus> = decorated
        .into_iter()
        .filter(|e| e.status.color == super::status::StatusColor::Green)
        .collect();

    Ok(Json(ready))
}

/// GET /api/clients/:id/time-entry-summary
/// Status counts over one client's time entries, as shown on the
/// client invoicing dashboard.
pub async fn client_status_summary(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<StatusSummary>, AppError> {
    let client = load_client(&state, params.user_id, Some(client_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {client_id} not found")))?;

    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND client_id = $2",
    )
    .bind(params.user_id)
    .bind(client_id)
    .fetch_all(&state.db)
    .await?;

    let today = Utc::now().date_naive();
    Ok(Json(summarize(&entries, &client, today)))
}

/// GET /api/time-entries/stats
pub async fn time_entry_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<crate::health_score::inputs::TimeStats>, AppError> {
    let today = Utc::now().date_naive();
    let stats = fetch_time_stats(&state.db, params.user_id, today).await?;
    Ok(Json(stats))
}

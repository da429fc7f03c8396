use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::client::ClientRow;
use crate::models::invoice::{InvoiceRow, InvoiceStatus};
use crate::state::AppState;

use super::metrics;

#[derive(Deserialize)]
pub struct ListInvoicesQuery {
    pub user_id: Uuid,
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<Uuid>,
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceRow>>, AppError> {
    let invoices: Vec<InvoiceRow> = sqlx::query_as(
        r#"
        SELECT * FROM invoices
        WHERE user_id = $1
          AND ($2::invoice_status IS NULL OR status = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
        ORDER BY invoice_date DESC, invoice_number DESC
        "#,
    )
    .bind(params.user_id)
    .bind(params.status)
    .bind(params.client_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(invoices))
}

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: f64,
    pub vat_rate: Option<f64>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceRow>), AppError> {
    if req.subtotal < 0.0 {
        return Err(AppError::Validation("Subtotal cannot be negative".to_string()));
    }

    let client: Option<ClientRow> =
        sqlx::query_as("SELECT * FROM clients WHERE id = $1 AND user_id = $2")
            .bind(req.client_id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let client = client
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", req.client_id)))?;

    let invoice_date = req.invoice_date.unwrap_or_else(|| Utc::now().date_naive());
    // Due date follows the client's payment terms unless given explicitly.
    let due_date = req
        .due_date
        .unwrap_or_else(|| invoice_date + Days::new(client.default_payment_terms.max(0) as u64));

    let invoice_number = match req.invoice_number {
        Some(number) => number,
        None => {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = $1")
                    .bind(req.user_id)
                    .fetch_one(&state.db)
                    .await?;
            format!("{}-{:04}", invoice_date.year(), count + 1)
        }
    };

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM invoices WHERE user_id = $1 AND invoice_number = $2")
            .bind(req.user_id)
            .bind(&invoice_number)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Invoice number {invoice_number} already exists"
        )));
    }

    let vat_rate = req.vat_rate.unwrap_or(0.21);
    let vat_amount = (req.subtotal * vat_rate * 100.0).round() / 100.0;
    let total_amount = req.subtotal + vat_amount;

    let invoice: InvoiceRow = sqlx::query_as(
        r#"
        INSERT INTO invoices
            (user_id, client_id, invoice_number, invoice_date, due_date,
             subtotal, vat_amount, total_amount, reference, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.client_id)
    .bind(&invoice_number)
    .bind(invoice_date)
    .bind(due_date)
    .bind(req.subtotal)
    .bind(vat_amount)
    .bind(total_amount)
    .bind(req.reference)
    .bind(req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InvoiceRow>, AppError> {
    let invoice: Option<InvoiceRow> =
        sqlx::query_as("SELECT * FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;

    invoice
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub user_id: Uuid,
    pub status: InvoiceStatus,
}

/// PATCH /api/invoices/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<InvoiceRow>, AppError> {
    let invoice: Option<InvoiceRow> =
        sqlx::query_as("SELECT * FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let invoice =
        invoice.ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))?;

    if !invoice.status.can_transition_to(req.status) {
        return Err(AppError::UnprocessableEntity(format!(
            "Invoice cannot move from {:?} to {:?}",
            invoice.status, req.status
        )));
    }

    let now = Utc::now();
    let sent_at = if req.status == InvoiceStatus::Sent {
        Some(now)
    } else {
        invoice.sent_at
    };
    let (paid_at, paid_amount) = if req.status == InvoiceStatus::Paid {
        (Some(now), invoice.total_amount)
    } else {
        (invoice.paid_at, invoice.paid_amount)
    };

    let updated: InvoiceRow = sqlx::query_as(
        r#"
        UPDATE invoices
        SET status = $1, sent_at = $2, paid_at = $3, paid_amount = $4, updated_at = now()
        WHERE id = $5 AND user_id = $6
        RETURNING *
        "#,
    )
    .bind(req.status)
    .bind(sent_at)
    .bind(paid_at)
    .bind(paid_amount)
    .bind(id)
    .bind(req.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/invoices/:id (drafts only).
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let invoice: Option<InvoiceRow> =
        sqlx::query_as("SELECT * FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;
    let invoice =
        invoice.ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))?;

    if invoice.status != InvoiceStatus::Draft {
        return Err(AppError::UnprocessableEntity(
            "Only draft invoices can be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM invoices WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/invoices/dashboard-metrics
pub async fn dashboard_metrics(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<crate::health_score::inputs::DashboardMetrics>, AppError> {
    let today = Utc::now().date_naive();
    let metrics = metrics::dashboard_metrics(&state.db, params.user_id, today).await?;
    Ok(Json(metrics))
}

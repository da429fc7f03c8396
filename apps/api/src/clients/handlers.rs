use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Days, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::client::{ClientRow, InvoicingFrequency};
use crate::models::time_entry::TimeEntryRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListClientsQuery {
    pub user_id: Uuid,
    pub active: Option<bool>,
    pub limit: Option<i64>,
}

/// GET /api/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ListClientsQuery>,
) -> Result<Json<Vec<ClientRow>>, AppError> {
    let clients: Vec<ClientRow> = sqlx::query_as(
        r#"
        SELECT * FROM clients
        WHERE user_id = $1 AND ($2::boolean IS NULL OR active = $2)
        ORDER BY name ASC
        LIMIT $3
        "#,
    )
    .bind(params.user_id)
    .bind(params.active)
    .bind(params.limit.unwrap_or(100).clamp(1, 500))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(clients))
}

#[derive(Deserialize)]
pub struct CreateClientRequest {
    pub user_id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub vat_number: Option<String>,
    pub is_business: Option<bool>,
    pub is_supplier: Option<bool>,
    pub default_payment_terms: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub invoicing_frequency: Option<InvoicingFrequency>,
    pub notes: Option<String>,
}

fn validate_client(name: &str, payment_terms: i32) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Client name is required".to_string()));
    }
    if payment_terms < 0 {
        return Err(AppError::Validation(
            "Payment terms cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/clients
pub async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientRow>), AppError> {
    let payment_terms = req.default_payment_terms.unwrap_or(30);
    validate_client(&req.name, payment_terms)?;

    let client: ClientRow = sqlx::query_as(
        r#"
        INSERT INTO clients
            (user_id, name, company_name, email, phone, address, postal_code, city,
             country_code, vat_number, is_business, is_supplier, default_payment_terms,
             hourly_rate, invoicing_frequency, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.name.trim())
    .bind(req.company_name)
    .bind(req.email)
    .bind(req.phone)
    .bind(req.address)
    .bind(req.postal_code)
    .bind(req.city)
    .bind(req.country_code.unwrap_or_else(|| "NL".to_string()))
    .bind(req.vat_number)
    .bind(req.is_business.unwrap_or(true))
    .bind(req.is_supplier.unwrap_or(false))
    .bind(payment_terms)
    .bind(req.hourly_rate)
    .bind(req.invoicing_frequency.unwrap_or_default())
    .bind(req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/clients/:id
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ClientRow>, AppError> {
    let client: Option<ClientRow> =
        sqlx::query_as("SELECT * FROM clients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;

    client
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))
}

#[derive(Deserialize)]
pub struct UpdateClientRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub vat_number: Option<String>,
    pub is_business: Option<bool>,
    pub is_supplier: Option<bool>,
    pub default_payment_terms: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub invoicing_frequency: Option<InvoicingFrequency>,
    pub active: Option<bool>,
    pub notes: Option<String>,
}

/// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<ClientRow>, AppError> {
    let existing: Option<ClientRow> =
        sqlx::query_as("SELECT * FROM clients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(req.user_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))?;

    let name = req.name.unwrap_or(existing.name);
    let payment_terms = req.default_payment_terms.unwrap_or(existing.default_payment_terms);
    validate_client(&name, payment_terms)?;

    let client: ClientRow = sqlx::query_as(
        r#"
        UPDATE clients
        SET name = $1, company_name = $2, email = $3, phone = $4, address = $5,
            postal_code = $6, city = $7, country_code = $8, vat_number = $9,
            is_business = $10, is_supplier = $11, default_payment_terms = $12,
            hourly_rate = $13, invoicing_frequency = $14, active = $15, notes = $16,
            updated_at = now()
        WHERE id = $17 AND user_id = $18
        RETURNING *
        "#,
    )
    .bind(name.trim())
    .bind(req.company_name.or(existing.company_name))
    .bind(req.email.or(existing.email))
    .bind(req.phone.or(existing.phone))
    .bind(req.address.or(existing.address))
    .bind(req.postal_code.or(existing.postal_code))
    .bind(req.city.or(existing.city))
    .bind(req.country_code.unwrap_or(existing.country_code))
    .bind(req.vat_number.or(existing.vat_number))
    .bind(req.is_business.unwrap_or(existing.is_business))
    .bind(req.is_supplier.unwrap_or(existing.is_supplier))
    .bind(payment_terms)
    .bind(req.hourly_rate.or(existing.hourly_rate))
    .bind(req.invoicing_frequency.unwrap_or(existing.invoicing_frequency))
    .bind(req.active.unwrap_or(existing.active))
    .bind(req.notes.or(existing.notes))
    .bind(id)
    .bind(req.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(client))
}

/// DELETE /api/clients/:id
/// Refused while time entries or invoices still reference the client.
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let entry_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM time_entries WHERE client_id = $1")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    let invoice_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE client_id = $1")
            .bind(id)
            .fetch_one(&state.db)
            .await?;

    if entry_count > 0 || invoice_count > 0 {
        return Err(AppError::UnprocessableEntity(format!(
            "Client has {entry_count} time entries and {invoice_count} invoices; deactivate instead"
        )));
    }

    let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Client {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ClientStats {
    pub total: usize,
    pub active: usize,
    pub business: usize,
    pub individual: usize,
    pub top_client: Option<TopClientShare>,
}

#[derive(Serialize)]
pub struct TopClientShare {
    pub id: Uuid,
    pub name: String,
    /// Share of rolling 30-day billable revenue, in percent.
    pub revenue_share: f64,
}

/// GET /api/clients/stats
pub async fn client_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ClientStats>, AppError> {
    let clients: Vec<ClientRow> = sqlx::query_as("SELECT * FROM clients WHERE user_id = $1")
        .bind(params.user_id)
        .fetch_all(&state.db)
        .await?;

    let today = Utc::now().date_naive();
    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND billable AND entry_date >= $2",
    )
    .bind(params.user_id)
    .bind(today - Days::new(29))
    .fetch_all(&state.db)
    .await?;

    let mut revenue_by_client: HashMap<Uuid, f64> = HashMap::new();
    let mut total_revenue = 0.0;
    for entry in &entries {
        let value = entry.value();
        total_revenue += value;
        if let Some(client_id) = entry.client_id {
            *revenue_by_client.entry(client_id).or_insert(0.0) += value;
        }
    }

    let top_client = revenue_by_client
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .and_then(|(id, revenue)| {
            clients.iter().find(|c| c.id == *id).map(|c| TopClientShare {
                id: c.id,
                name: c.name.clone(),
                revenue_share: if total_revenue > 0.0 {
                    revenue / total_revenue * 100.0
                } else {
                    0.0
                },
            })
        });

    Ok(Json(ClientStats {
        total: clients.len(),
        active: clients.iter().filter(|c| c.active).count(),
        business: clients.iter().filter(|c| c.is_business).count(),
        individual: clients.iter().filter(|c| !c.is_business).count(),
        top_client,
    }))
}

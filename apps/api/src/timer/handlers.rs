use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::time_entry::TimeEntryRow;
use crate::models::timer::TimerSessionRow;
use crate::state::AppState;

use super::session::{
    format_elapsed, StartTimerParams, TimerSession, TimerState, TimerTransitionError,
};

impl From<TimerSessionRow> for TimerSession {
    fn from(row: TimerSessionRow) -> Self {
        TimerSession {
            client_id: row.client_id,
            client_name: row.client_name,
            project_name: row.project_name,
            description: row.description,
            billable: row.billable,
            hourly_rate: row.hourly_rate,
            started_at: row.started_at,
            paused_seconds: row.paused_seconds,
            is_paused: row.is_paused,
        }
    }
}

impl From<TimerTransitionError> for AppError {
    fn from(err: TimerTransitionError) -> Self {
        AppError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Serialize)]
pub struct TimerStatusResponse {
    pub active: bool,
    pub state: Option<TimerState>,
    pub session: Option<TimerSession>,
    pub elapsed_seconds: i64,
    pub elapsed_display: String,
}

impl TimerStatusResponse {
    fn idle() -> Self {
        TimerStatusResponse {
            active: false,
            state: None,
            session: None,
            elapsed_seconds: 0,
            elapsed_display: format_elapsed(0),
        }
    }

    fn active(session: TimerSession, now: DateTime<Utc>) -> Self {
        let elapsed = session.elapsed_seconds(now);
        TimerStatusResponse {
            active: true,
            state: Some(session.state()),
            elapsed_seconds: elapsed,
            elapsed_display: format_elapsed(elapsed),
            session: Some(session),
        }
    }
}

async fn load_session(pool: &PgPool, user_id: Uuid) -> Result<Option<TimerSessionRow>, AppError> {
    let row: Option<TimerSessionRow> =
        sqlx::query_as("SELECT * FROM timer_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row)
}

async fn save_session(
    pool: &PgPool,
    user_id: Uuid,
    session: &TimerSession,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO timer_sessions
            (user_id, client_id, client_name, project_name, description, billable,
             hourly_rate, started_at, paused_seconds, is_paused)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO UPDATE SET
            client_id = EXCLUDED.client_id,
            client_name = EXCLUDED.client_name,
            project_name = EXCLUDED.project_name,
            description = EXCLUDED.description,
            billable = EXCLUDED.billable,
            hourly_rate = EXCLUDED.hourly_rate,
            started_at = EXCLUDED.started_at,
            paused_seconds = EXCLUDED.paused_seconds,
            is_paused = EXCLUDED.is_paused,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(session.client_id)
    .bind(&session.client_name)
    .bind(&session.project_name)
    .bind(&session.description)
    .bind(session.billable)
    .bind(session.hourly_rate)
    .bind(session.started_at)
    .bind(session.paused_seconds)
    .bind(session.is_paused)
    .execute(pool)
    .await?;
    Ok(())
}

async fn clear_session(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM timer_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/timer
/// Restores the stored session, discarding it when stale.
pub async fn current_session(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TimerStatusResponse>, AppError> {
    let now = Utc::now();
    let Some(row) = load_session(&state.db, params.user_id).await? else {
        return Ok(Json(TimerStatusResponse::idle()));
    };

    let session = TimerSession::from(row);
    if session.is_stale(now) {
        info!("Discarding stale timer session for user {}", params.user_id);
        clear_session(&state.db, params.user_id).await?;
        return Ok(Json(TimerStatusResponse::idle()));
    }

    Ok(Json(TimerStatusResponse::active(session, now)))
}

#[derive(Deserialize)]
pub struct StartTimerRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub params: StartTimerParams,
}

/// POST /api/timer/start
/// Starting over an existing session overwrites it (last writer wins).
pub async fn start_timer(
    State(state): State<AppState>,
    Json(req): Json<StartTimerRequest>,
) -> Result<(StatusCode, Json<TimerStatusResponse>), AppError> {
    let now = Utc::now();
    let session = TimerSession::start(req.params, now);
    save_session(&state.db, req.user_id, &session).await?;
    info!("Started timer for user {} (client {})", req.user_id, session.client_id);
    Ok((StatusCode::CREATED, Json(TimerStatusResponse::active(session, now))))
}

/// POST /api/timer/pause
pub async fn pause_timer(
    State(state): State<AppState>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<TimerStatusResponse>, AppError> {
    let now = Utc::now();
    let row = load_session(&state.db, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active timer session".to_string()))?;

    let mut session = TimerSession::from(row);
    session.pause(now)?;
    save_session(&state.db, req.user_id, &session).await?;
    Ok(Json(TimerStatusResponse::active(session, now)))
}

/// POST /api/timer/resume
pub async fn resume_timer(
    State(state): State<AppState>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<TimerStatusResponse>, AppError> {
    let now = Utc::now();
    let row = load_session(&state.db, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active timer session".to_string()))?;

    let mut session = TimerSession::from(row);
    session.resume(now)?;
    save_session(&state.db, req.user_id, &session).await?;
    Ok(Json(TimerStatusResponse::active(session, now)))
}

#[derive(Serialize)]
pub struct StopTimerResponse {
    pub elapsed_seconds: i64,
    pub hours: f64,
    pub entry: Option<TimeEntryRow>,
}

/// POST /api/timer/stop
/// Computes total elapsed time, saves a time entry when there is
/// anything to save, and clears the session.
pub async fn stop_timer(
    State(state): State<AppState>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<StopTimerResponse>, AppError> {
    let now = Utc::now();
    let row = load_session(&state.db, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active timer session".to_string()))?;

    let session = TimerSession::from(row);
    let elapsed_seconds = session.elapsed_seconds(now);
    let hours = session.elapsed_hours(now);

    let entry = if hours > 0.0 {
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
        .bind(session.client_id)
        .bind(&session.project_name)
        .bind(&session.description)
        .bind(now.date_naive())
        .bind(hours)
        .bind(session.hourly_rate)
        .bind(session.billable)
        .fetch_one(&state.db)
        .await?;

        info!(
            "Saved {hours}h time entry from timer for user {} (client {})",
            req.user_id, session.client_name
        );
        Some(entry)
    } else {
        None
    };

    clear_session(&state.db, req.user_id).await?;

    Ok(Json(StopTimerResponse {
        elapsed_seconds,
        hours,
        entry,
    }))
}

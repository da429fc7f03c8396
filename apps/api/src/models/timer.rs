use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted form of an active timer session, at most one per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimerSessionRow {
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub project_name: Option<String>,
    pub description: String,
    pub billable: bool,
    pub hourly_rate: f64,
    pub started_at: DateTime<Utc>,
    pub paused_seconds: i64,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

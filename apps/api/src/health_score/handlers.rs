use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

use super::assemble::assemble_inputs;
use super::engine::{HealthScoreEngine, HealthScoreError};
use super::inputs::HealthScoreOutputs;
use super::status::{next_milestone, status_for_score, HealthStatus, Milestone};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct HealthScoreResponse {
    pub status: HealthStatus,
    pub message: &'static str,
    pub next_milestone: Option<Milestone>,
    #[serde(flatten)]
    pub outputs: HealthScoreOutputs,
}

/// GET /api/dashboard/health-score
pub async fn health_score(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<HealthScoreResponse>, AppError> {
    let today = Utc::now().date_naive();
    let inputs = assemble_inputs(&state.db, params.user_id, today).await?;

    let outputs = HealthScoreEngine::default()
        .process(&inputs, today)
        .map_err(|e| match e {
            HealthScoreError::TargetsNotConfigured => {
                AppError::UnprocessableEntity(e.to_string())
            }
        })?;

    let status = status_for_score(outputs.scores.total_rounded);
    Ok(Json(HealthScoreResponse {
        status,
        message: status.message(),
        next_milestone: next_milestone(outputs.scores.total_rounded),
        outputs,
    }))
}

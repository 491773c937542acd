use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::profile::ProfileRow;
use crate::profile::models::FormStep;
use crate::profile::progress::{compute_progress, ProfileProgress};
use crate::profile::steps::{check_cross_step, normalize_step};
use crate::profile::store::{assemble_profile, get_profile_row, mark_submitted, upsert_step};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileRow,
    pub progress: ProfileProgress,
}

impl From<ProfileRow> for ProfileResponse {
    fn from(profile: ProfileRow) -> Self {
        let progress = compute_progress(&profile);
        Self { profile, progress }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub warnings: Vec<String>,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let row = get_profile_row(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No profile has been started".to_string()))?;
    Ok(Json(row.into()))
}

/// PUT /api/v1/profile/steps/:step
pub async fn handle_save_step(
    State(state): State<AppState>,
    user: AuthUser,
    Path(step): Path<String>,
    AppJson(payload): AppJson<Value>,
) -> Result<Json<ProfileResponse>, AppError> {
    let step: FormStep = step.parse().map_err(AppError::Validation)?;
    let data = normalize_step(step, payload)?;
    let row = upsert_step(&state.db, user.user_id, step, &data).await?;
    Ok(Json(row.into()))
}

/// POST /api/v1/profile/submit
pub async fn handle_submit_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubmitResponse>, AppError> {
    let row = get_profile_row(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::Validation("Profile is incomplete; no steps saved".to_string()))?;

    let profile = assemble_profile(&row)?;
    let (errors, warnings) = check_cross_step(&profile);
    if !errors.is_empty() {
        return Err(AppError::InvalidFields(errors));
    }

    let row = mark_submitted(&state.db, row.id).await?;
    info!(
        "Profile {} submitted by user {} ({} warnings)",
        row.id,
        user.user_id,
        warnings.len()
    );

    Ok(Json(SubmitResponse {
        profile: row.into(),
        warnings,
    }))
}

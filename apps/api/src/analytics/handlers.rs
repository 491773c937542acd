use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::dashboard::{build_dashboard, Dashboard};
use crate::analytics::overview::{fetch_overview, Overview};
use crate::auth::{require_role, AuthUser, Role};
use crate::errors::AppError;
use crate::recommendation::store::{decode_set, latest_run};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

/// GET /api/v1/analytics/me
pub async fn handle_my_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let run = latest_run(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No recommendations generated yet".to_string()))?;
    let set = decode_set(&run)?;

    Ok(Json(DashboardResponse {
        run_id: run.id,
        generated_at: run.created_at,
        dashboard: build_dashboard(&set),
    }))
}

/// GET /api/v1/analytics/overview
pub async fn handle_overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Overview>, AppError> {
    require_role(&user, &[Role::Counselor, Role::Admin])?;
    Ok(Json(fetch_overview(&state.db).await?))
}

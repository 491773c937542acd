use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::recommendation::{RecommendationRunRow, RecommendationRunSummaryRow};
use crate::recommendation::generator::generate_recommendations;
use crate::recommendation::models::RecommendationSet;
use crate::recommendation::report::{render_markdown, report_key, upload_report};
use crate::recommendation::store::{
    decode_set, get_run, list_runs, set_report_key, upsert_feedback,
};
use crate::state::AppState;
use crate::validation::{sanitize_optional, FieldErrors};

const FEEDBACK_COMMENT_MAX: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub career_id: String,
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub run_id: Uuid,
    pub report_key: String,
}

/// Validated feedback fields.
#[derive(Debug, PartialEq)]
pub struct Feedback {
    pub career_id: String,
    pub rating: i16,
    pub comment: Option<String>,
}

pub fn validate_feedback(req: FeedbackRequest, set: &RecommendationSet) -> Result<Feedback, AppError> {
    let career_id = req.career_id.trim().to_string();
    let comment = sanitize_optional(req.comment.as_deref(), FEEDBACK_COMMENT_MAX);

    let mut errors = FieldErrors::new();
    errors.range("rating", req.rating, 1, 5);
    if !set.contains_career(&career_id) {
        errors.push("career_id", "is not part of this recommendation run");
    }
    errors.into_result()?;

    Ok(Feedback {
        career_id,
        rating: req.rating,
        comment,
    })
}

async fn load_run_for(
    state: &AppState,
    user: &AuthUser,
    run_id: Uuid,
) -> Result<RecommendationRunRow, AppError> {
    let run = get_run(&state.db, run_id).await?;
    if !user.can_access(run.user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(run)
}

/// POST /api/v1/recommendations
pub async fn handle_generate(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<RecommendationRunRow>), AppError> {
    let run = generate_recommendations(&state, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /api/v1/recommendations
pub async fn handle_list_runs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<RecommendationRunSummaryRow>>, AppError> {
    Ok(Json(list_runs(&state.db, user.user_id).await?))
}

/// GET /api/v1/recommendations/:id
pub async fn handle_get_run(
    State(state): State<AppState>,
    user: AuthUser,
    Path(run_id): Path<Uuid>,
) -> Result<Json<RecommendationRunRow>, AppError> {
    Ok(Json(load_run_for(&state, &user, run_id).await?))
}

/// POST /api/v1/recommendations/:id/report
pub async fn handle_export_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    let run = load_run_for(&state, &user, run_id).await?;
    let set = decode_set(&run)?;

    let student_name: String = sqlx::query_scalar("SELECT full_name FROM users WHERE id = $1")
        .bind(run.user_id)
        .fetch_optional(&state.db)
        .await?
        .unwrap_or_else(|| "Student".to_string());

    let key = report_key(run.user_id, run.id);
    let markdown =
        render_markdown(&run, &set, &student_name).context("Rendering career report failed")?;
    upload_report(&state.s3, &state.config.s3_bucket, &key, markdown).await?;
    set_report_key(&state.db, run.id, &key).await?;

    Ok(Json(ReportResponse {
        run_id: run.id,
        report_key: key,
    }))
}

/// POST /api/v1/recommendations/:id/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(run_id): Path<Uuid>,
    AppJson(req): AppJson<FeedbackRequest>,
) -> Result<StatusCode, AppError> {
    let run = get_run(&state.db, run_id).await?;
    if run.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    let feedback = validate_feedback(req, &decode_set(&run)?)?;

    upsert_feedback(
        &state.db,
        run.id,
        &feedback.career_id,
        user.user_id,
        feedback.rating,
        feedback.comment.as_deref(),
    )
    .await?;

    info!(
        "Feedback {} for career {} on run {}",
        feedback.rating, feedback.career_id, run.id
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::sample_profile;
    use crate::recommendation::pipeline::rule_based_set;
    use crate::reference::test_catalog;

    fn set() -> RecommendationSet {
        rule_based_set("rule_based", &sample_profile(), &test_catalog(), 3)
    }

    fn request(career_id: &str, rating: i16, comment: Option<&str>) -> FeedbackRequest {
        FeedbackRequest {
            career_id: career_id.to_string(),
            rating,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_feedback_is_sanitized() {
        let feedback = validate_feedback(
            request(" software-engineer ", 4, Some("  <b>Very</b> helpful ")),
            &set(),
        )
        .unwrap();
        assert_eq!(
            feedback,
            Feedback {
                career_id: "software-engineer".to_string(),
                rating: 4,
                comment: Some("Very helpful".to_string()),
            }
        );
    }

    #[test]
    fn test_feedback_rejects_bad_rating_and_foreign_career() {
        match validate_feedback(request("astronaut", 6, None), &set()) {
            Err(AppError::InvalidFields(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["rating", "career_id"]);
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
        assert!(validate_feedback(request("software-engineer", 0, None), &set()).is_err());
    }
}

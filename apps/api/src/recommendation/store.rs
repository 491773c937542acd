use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::recommendation::{RecommendationRunRow, RecommendationRunSummaryRow};
use crate::recommendation::models::RecommendationSet;

/// A run about to be recorded.
pub struct NewRun<'a> {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub fingerprint: &'a str,
    pub set: &'a RecommendationSet,
    pub cached: bool,
}

/// Inserts the run and one item row per recommendation in a single transaction.
pub async fn persist_run(pool: &PgPool, run: NewRun<'_>) -> Result<RecommendationRunRow, AppError> {
    let NewRun {
        user_id,
        profile_id,
        fingerprint,
        set,
        cached,
    } = run;
    let result = serde_json::to_value(set).map_err(|e| AppError::Internal(e.into()))?;

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, RecommendationRunRow>(
        r#"
        INSERT INTO recommendation_runs
            (id, user_id, profile_id, engine, ai_enhanced, cached, profile_fingerprint, summary, result)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(profile_id)
    .bind(&set.engine)
    .bind(set.ai_enhanced)
    .bind(cached)
    .bind(fingerprint)
    .bind(&set.summary)
    .bind(&result)
    .fetch_one(&mut *tx)
    .await?;

    for rec in &set.recommendations {
        let payload = serde_json::to_value(rec).map_err(|e| AppError::Internal(e.into()))?;
        sqlx::query(
            r#"
            INSERT INTO recommendation_items
                (id, run_id, rank, career_id, career_title, category, match_score, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.id)
        .bind(rec.rank as i32)
        .bind(&rec.career_id)
        .bind(&rec.title)
        .bind(&rec.category)
        .bind(rec.match_score as i32)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        "Recorded recommendation run {} for user {} ({} careers, engine={}, cached={})",
        row.id,
        user_id,
        set.recommendations.len(),
        set.engine,
        cached
    );
    Ok(row)
}

pub async fn get_run(pool: &PgPool, run_id: Uuid) -> Result<RecommendationRunRow, AppError> {
    sqlx::query_as::<_, RecommendationRunRow>("SELECT * FROM recommendation_runs WHERE id = $1")
        .bind(run_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recommendation run {run_id} not found")))
}

pub async fn latest_run(pool: &PgPool, user_id: Uuid) -> Result<Option<RecommendationRunRow>, AppError> {
    Ok(sqlx::query_as::<_, RecommendationRunRow>(
        r#"
        SELECT * FROM recommendation_runs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// Newest first, without the result payload.
pub async fn list_runs(pool: &PgPool, user_id: Uuid) -> Result<Vec<RecommendationRunSummaryRow>, AppError> {
    Ok(sqlx::query_as::<_, RecommendationRunSummaryRow>(
        r#"
        SELECT r.id, r.engine, r.ai_enhanced, r.cached, r.summary, r.created_at,
               COUNT(i.id) AS item_count,
               MAX(i.match_score) AS top_score
        FROM recommendation_runs r
        LEFT JOIN recommendation_items i ON i.run_id = r.id
        WHERE r.user_id = $1
        GROUP BY r.id
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn set_report_key(pool: &PgPool, run_id: Uuid, key: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE recommendation_runs SET report_key = $1 WHERE id = $2")
        .bind(key)
        .bind(run_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// One rating per (run, career); a later submission replaces the earlier one.
pub async fn upsert_feedback(
    pool: &PgPool,
    run_id: Uuid,
    career_id: &str,
    user_id: Uuid,
    rating: i16,
    comment: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO recommendation_feedback (run_id, career_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (run_id, career_id) DO UPDATE
        SET rating = EXCLUDED.rating,
            comment = EXCLUDED.comment,
            user_id = EXCLUDED.user_id,
            created_at = NOW()
        "#,
    )
    .bind(run_id)
    .bind(career_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;
    Ok(())
}

/// Decodes the stored result payload of a run.
pub fn decode_set(run: &RecommendationRunRow) -> Result<RecommendationSet, AppError> {
    serde_json::from_value(run.result.clone()).map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "Stored result of run {} is corrupt: {e}",
            run.id
        ))
    })
}

use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::profile::models::{FormStep, StudentProfile};

pub async fn get_profile_row(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ProfileRow>("SELECT * FROM student_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Saves one step. Any edit moves the profile back to `draft`.
pub async fn upsert_step(
    pool: &PgPool,
    user_id: Uuid,
    step: FormStep,
    data: &Value,
) -> Result<ProfileRow, AppError> {
    // Column names come from a closed enum, never from the request.
    let column = step.column();
    let sql = format!(
        r#"
        INSERT INTO student_profiles (id, user_id, {column}, status, updated_at)
        VALUES ($1, $2, $3, 'draft', NOW())
        ON CONFLICT (user_id) DO UPDATE
        SET {column} = EXCLUDED.{column},
            status = 'draft',
            submitted_at = NULL,
            updated_at = NOW()
        RETURNING *
        "#
    );

    let row = sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data)
        .fetch_one(pool)
        .await?;

    info!("Saved profile step '{step}' for user {user_id}");
    Ok(row)
}

pub async fn mark_submitted(pool: &PgPool, profile_id: Uuid) -> Result<ProfileRow, AppError> {
    Ok(sqlx::query_as::<_, ProfileRow>(
        r#"
        UPDATE student_profiles
        SET status = 'submitted', submitted_at = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?)
}

/// Assembles the typed profile from a row. Fails with the list of unsaved steps.
pub fn assemble_profile(row: &ProfileRow) -> Result<StudentProfile, AppError> {
    let mut missing = Vec::new();

    let personal = decode_step(&row.personal, FormStep::Personal, &mut missing)?;
    let academic = decode_step(&row.academic, FormStep::Academic, &mut missing)?;
    let socioeconomic = decode_step(&row.socioeconomic, FormStep::Socioeconomic, &mut missing)?;
    let aspirations = decode_step(&row.aspirations, FormStep::Aspirations, &mut missing)?;
    let constraints = decode_step(&row.study_constraints, FormStep::Constraints, &mut missing)?;

    match (personal, academic, socioeconomic, aspirations, constraints) {
        (Some(personal), Some(academic), Some(socioeconomic), Some(aspirations), Some(constraints)) => {
            Ok(StudentProfile {
                personal,
                academic,
                socioeconomic,
                aspirations,
                constraints,
            })
        }
        _ => Err(AppError::Validation(format!(
            "Profile is incomplete; missing steps: {}",
            missing
                .iter()
                .map(FormStep::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn decode_step<T: DeserializeOwned>(
    value: &Option<Value>,
    step: FormStep,
    missing: &mut Vec<FormStep>,
) -> Result<Option<T>, AppError> {
    match value {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored {step} step is corrupt: {e}"))),
        _ => {
            missing.push(step);
            Ok(None)
        }
    }
}

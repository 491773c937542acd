//! Axum route handlers for account registration and sessions.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{check_password_strength, dummy_hash, hash_password, verify_password};
use crate::auth::{AuthUser, Role};
use crate::cache::revoke_token;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::validation::{normalize_email, sanitize_text, FieldErrors};

const FULL_NAME_MAX: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserRow,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Sanitised registration fields, or every field error at once.
fn validate_registration(req: &RegisterRequest) -> Result<(String, String), AppError> {
    let email = normalize_email(&req.email);
    let full_name = sanitize_text(&req.full_name, FULL_NAME_MAX);

    let mut errors = FieldErrors::new();
    errors.email("email", &email);
    check_password_strength(&req.password, &mut errors);
    errors.length("full_name", &full_name, 2, FULL_NAME_MAX);
    errors.into_result()?;

    Ok((email, full_name))
}

/// Hashing is CPU-bound, keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {e}")))
}

async fn verify_off_thread(password: String, encoded: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification task failed: {e}")))
}

/// Unknown emails are checked against a dummy hash so they cost the same as a wrong password.
fn stored_hash_for(user: Option<&UserRow>) -> String {
    user.map_or_else(|| dummy_hash().to_string(), |u| u.password_hash.clone())
}

fn issue_response(state: &AppState, user: UserRow) -> Result<AuthResponse, AppError> {
    let role: Role = user
        .role
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    let issued = state
        .tokens
        .issue(user.id, role)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(AuthResponse {
        user,
        token: issued.token,
        expires_at: issued.expires_at,
    })
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (email, full_name) = validate_registration(&req)?;
    let password_hash = hash_off_thread(req.password).await?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(&full_name)
    .bind(Role::Student.as_str())
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            AppError::Conflict("An account with this email already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(issue_response(&state, user)?)))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let verified = verify_off_thread(req.password, stored_hash_for(user.as_ref())).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AppError::Unauthorized),
    };

    info!("User {} logged in", user.id);
    Ok(Json(issue_response(&state, user)?))
}

/// POST /api/v1/auth/logout
///
/// Adds the presented token to the deny-list until it would have expired anyway.
pub async fn handle_logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    revoke_token(&state.redis, user.jti, user.remaining_secs(Utc::now())).await?;
    info!("User {} logged out", user.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(row))
}

//! Authentication: password hashing, bearer tokens, and the `AuthUser` extractor.

pub mod handlers;
pub mod password;
pub mod token;

use std::fmt;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cache::is_token_revoked;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Counselor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Counselor => "counselor",
            Role::Admin => "admin",
        }
    }

    /// Counselors and admins may read any student's recommendations.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Counselor | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "counselor" => Ok(Role::Counselor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    /// Owners can always access their own data; staff can access anyone's.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.role.is_staff()
    }

    /// Seconds until the presented token expires, never negative.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}

pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Extracts the token from `Authorization: Bearer <token>`. The scheme is case-sensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected bearer token: {e}");
            AppError::Unauthorized
        })?;

        if is_token_revoked(&state.redis, claims.jti).await? {
            debug!("Rejected revoked token {}", claims.jti);
            return Err(AppError::Unauthorized);
        }

        let expires_at = claims.expires_at().map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            jti: claims.jti,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
            jti: Uuid::new_v4(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_require_role() {
        let student = user(Role::Student);
        assert!(matches!(
            require_role(&student, &[Role::Counselor, Role::Admin]),
            Err(AppError::Forbidden)
        ));
        assert!(require_role(&user(Role::Admin), &[Role::Counselor, Role::Admin]).is_ok());
    }

    #[test]
    fn test_can_access() {
        let student = user(Role::Student);
        assert!(student.can_access(student.user_id));
        assert!(!student.can_access(Uuid::new_v4()));
        assert!(user(Role::Counselor).can_access(Uuid::new_v4()));
    }

    #[test]
    fn test_remaining_secs_never_negative() {
        let mut student = user(Role::Student);
        let now = Utc::now();
        student.expires_at = now + chrono::Duration::seconds(60);
        assert_eq!(student.remaining_secs(now), 60);
        student.expires_at = now - chrono::Duration::seconds(5);
        assert_eq!(student.remaining_secs(now), 0);
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Student, Role::Counselor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }
}

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Role;

#[derive(Debug, Error)]
pub enum AuthTokenError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token timestamp out of range")]
    InvalidTimestamp,
}

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    /// Unique per token; the revocation deny-list is keyed on it.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Result<DateTime<Utc>, AuthTokenError> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .ok_or(AuthTokenError::InvalidTimestamp)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<IssuedToken, AuthTokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthTokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            role,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthTokenError> {
        let validation = Validation::new(Algorithm::HS256);
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    #[test]
    fn test_issue_then_verify() {
        let issuer = TokenIssuer::new(SECRET, 24);
        let user_id = Uuid::new_v4();
        let issued = issuer.issue(user_id, Role::Counselor).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Counselor);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.expires_at().unwrap().timestamp(), claims.exp);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(SECRET, 1);
        let issued = issuer
            .issue_at(Uuid::new_v4(), Role::Student, Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(issuer.verify(&issued.token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(SECRET, 1);
        let other = TokenIssuer::new("another-secret-that-is-also-32-bytes!!", 1);
        let issued = issuer.issue(Uuid::new_v4(), Role::Student).unwrap();
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new(SECRET, 1);
        assert!(issuer.verify("not.a.jwt").is_err());
    }
}

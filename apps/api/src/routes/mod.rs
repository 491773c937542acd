pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::analytics::handlers as analytics;
use crate::auth::handlers as auth;
use crate::config::Config;
use crate::profile::handlers as profile;
use crate::recommendation::handlers as recommendations;
use crate::reference::handlers as reference;
use crate::state::AppState;

/// Enforced by the JSON extractor, so oversized bodies get the standard 413 error body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Explicit origin list when configured, permissive otherwise (local development).
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

pub fn build_router(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Intake form
        .route("/api/v1/profile", get(profile::handle_get_profile))
        .route("/api/v1/profile/steps/:step", put(profile::handle_save_step))
        .route("/api/v1/profile/submit", post(profile::handle_submit_profile))
        // Reference catalogs (public)
        .route("/api/v1/reference/careers", get(reference::handle_list_careers))
        .route("/api/v1/reference/careers/:id", get(reference::handle_get_career))
        .route("/api/v1/reference/interests", get(reference::handle_list_interests))
        // Recommendations
        .route(
            "/api/v1/recommendations",
            post(recommendations::handle_generate).get(recommendations::handle_list_runs),
        )
        .route("/api/v1/recommendations/:id", get(recommendations::handle_get_run))
        .route(
            "/api/v1/recommendations/:id/report",
            post(recommendations::handle_export_report),
        )
        .route(
            "/api/v1/recommendations/:id/feedback",
            post(recommendations::handle_feedback),
        )
        // Analytics
        .route("/api/v1/analytics/me", get(analytics::handle_my_dashboard))
        .route("/api/v1/analytics/overview", get(analytics::handle_overview))
        .layer(layers)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::auth::token::TokenIssuer;
    use crate::config::test_config;
    use crate::recommendation::engine::RuleBasedEngine;
    use crate::reference::test_catalog;

    /// State whose backing services are never contacted by the routes under test.
    fn test_state() -> AppState {
        let config = test_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let redis = redis::Client::open(config.redis_url.as_str()).unwrap();
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(&config.s3_endpoint)
            .build();

        AppState {
            db,
            redis,
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            tokens: TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_hours),
            config,
            catalog: Arc::new(test_catalog()),
            engine: Arc::new(RuleBasedEngine),
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "compass-api");
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer_token() {
        for uri in ["/api/v1/auth/me", "/api/v1/profile", "/api/v1/recommendations", "/api/v1/analytics/me"] {
            let (status, body) = send(get(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/profile")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reference_careers_are_public() {
        let (status, body) = send(get("/api/v1/reference/careers?category=Healthcare")).await;
        assert_eq!(status, StatusCode::OK);
        let careers = body.as_array().unwrap();
        assert!(!careers.is_empty());
        assert!(careers.iter().all(|c| c["category"] == "healthcare"));
    }

    #[tokio::test]
    async fn test_career_detail_and_unknown_career() {
        let (status, body) = send(get("/api/v1/reference/careers/software-engineer")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Software Engineer");
        assert!(body["colleges"].as_array().is_some_and(|c| !c.is_empty()));

        let (status, body) = send(get("/api/v1/reference/careers/astronaut")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "nope", "password": "short", "full_name": "K"}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["field"].as_str())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"full_name"));
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut payload = vec![b' '; MAX_BODY_BYTES + 1];
        payload[0] = b'{';
        let (status, body) = send(post_json("/api/v1/auth/login", payload)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_mistyped_json_uses_error_body() {
        let (status, body) = send(post_json(
            "/api/v1/auth/login",
            json!({"email": 1, "password": "secure123"}).to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_body() {
        let (status, body) = send(post_json("/api/v1/auth/register", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::recommendation::engine::RecommendationEngine;
use crate::reference::ReferenceCatalog;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Revoked-token deny-list and recommendation cache.
    pub redis: RedisClient,
    /// Exported career reports.
    pub s3: S3Client,
    pub config: Config,
    pub tokens: TokenIssuer,
    /// Reference catalogs, loaded and validated once at startup.
    pub catalog: Arc<ReferenceCatalog>,
    /// Pluggable recommendation engine. Default: RuleBasedEngine. AI-assisted when
    /// ANTHROPIC_API_KEY is set and ENABLE_AI_RECOMMENDATIONS is true.
    pub engine: Arc<dyn RecommendationEngine>,
}

mod analytics;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod extract;
mod llm_client;
mod models;
mod profile;
mod recommendation;
mod reference;
mod routes;
mod state;
mod validation;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::recommendation::engine::{AiAssistedEngine, RecommendationEngine, RuleBasedEngine};
use crate::reference::ReferenceCatalog;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Compass API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Reference catalogs: embedded defaults unless REFERENCE_DATA_DIR is set
    let catalog = Arc::new(ReferenceCatalog::load(config.reference_data_dir.as_deref())?);

    // Recommendation engine (RuleBasedEngine by default; swap via ENABLE_AI_RECOMMENDATIONS)
    let engine: Arc<dyn RecommendationEngine> = match config.anthropic_api_key.as_deref() {
        Some(key) if config.ai_enabled() => {
            let llm = LlmClient::new(key.to_string())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(AiAssistedEngine::new(llm))
        }
        _ => Arc::new(RuleBasedEngine),
    };
    info!("Recommendation engine: {}", engine.name());

    let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_hours);

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        config: config.clone(),
        tokens,
        catalog,
        engine,
    };

    // Build router (trace, CORS and body-limit layers are applied inside)
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "compass-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not virtual host
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

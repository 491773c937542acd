use redis::Client as RedisClient;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{get_string, set_string_ex};
use crate::errors::AppError;
use crate::models::recommendation::RecommendationRunRow;
use crate::profile::store::{assemble_profile, get_profile_row};
use crate::recommendation::engine::RecommendationEngine;
use crate::recommendation::models::RecommendationSet;
use crate::recommendation::store::{persist_run, NewRun};
use crate::state::AppState;

pub fn cache_key(engine: &str, fingerprint: &str, limit: usize) -> String {
    format!("rec:{engine}:{fingerprint}:{limit}")
}

/// Sets where the AI engine fell back to rule-based results are not cached.
pub fn is_cacheable(engine: &dyn RecommendationEngine, set: &RecommendationSet) -> bool {
    !engine.uses_ai() || set.ai_enhanced || set.recommendations.is_empty()
}

/// An entry that no longer decodes (e.g. written by an older build) is a miss.
fn decode_cached(key: &str, raw: &str) -> Option<RecommendationSet> {
    match serde_json::from_str(raw) {
        Ok(set) => Some(set),
        Err(e) => {
            warn!("Discarding unreadable cache entry {key}: {e}");
            None
        }
    }
}

/// Cache failures are logged and treated as a miss.
async fn read_cached(redis: &RedisClient, key: &str) -> Option<RecommendationSet> {
    match get_string(redis, key).await {
        Ok(Some(raw)) => decode_cached(key, &raw),
        Ok(None) => None,
        Err(e) => {
            warn!("Recommendation cache read failed for {key}: {e}");
            None
        }
    }
}

async fn write_cached(redis: &RedisClient, key: &str, set: &RecommendationSet, ttl_secs: u64) {
    let raw = match serde_json::to_string(set) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not encode recommendation set for caching: {e}");
            return;
        }
    };
    if let Err(e) = set_string_ex(redis, key, &raw, ttl_secs).await {
        warn!("Recommendation cache write failed for {key}: {e}");
    }
}

/// Runs the configured engine for the user's submitted profile and records the run.
pub async fn generate_recommendations(
    state: &AppState,
    user_id: Uuid,
) -> Result<RecommendationRunRow, AppError> {
    let row = get_profile_row(&state.db, user_id).await?.ok_or_else(|| {
        AppError::Validation("Complete and submit your profile first".to_string())
    })?;
    if row.status != "submitted" {
        return Err(AppError::Validation(
            "Profile must be submitted before generating recommendations".to_string(),
        ));
    }
    let profile = assemble_profile(&row)?;

    let engine = state.engine.as_ref();
    let limit = state.config.max_recommendations;
    let fingerprint = profile.fingerprint();
    let key = cache_key(engine.name(), &fingerprint, limit);

    let (set, cached) = match read_cached(&state.redis, &key).await {
        Some(set) => {
            info!("Recommendation cache hit for user {user_id}");
            (set, true)
        }
        None => {
            info!(
                "Generating recommendations for user {user_id} with engine {}",
                engine.name()
            );
            let set = engine.recommend(&profile, &state.catalog, limit).await?;
            if is_cacheable(engine, &set) {
                write_cached(
                    &state.redis,
                    &key,
                    &set,
                    state.config.recommendation_cache_ttl_secs,
                )
                .await;
            } else {
                debug!("Not caching degraded result for user {user_id}");
            }
            (set, false)
        }
    };

    persist_run(
        &state.db,
        NewRun {
            user_id,
            profile_id: row.id,
            fingerprint: &fingerprint,
            set: &set,
            cached,
        },
    )
    .await
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecommendationRunRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub engine: String,
    pub ai_enhanced: bool,
    pub cached: bool,
    pub profile_fingerprint: String,
    pub summary: String,
    pub result: Value,
    pub report_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Run listing without the full JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecommendationRunSummaryRow {
    pub id: Uuid,
    pub engine: String,
    pub ai_enhanced: bool,
    pub cached: bool,
    pub summary: String,
    pub item_count: i64,
    pub top_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

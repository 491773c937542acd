//! Recommendation engines: pluggable backends behind one trait.
//!
//! `AppState` carries an `Arc<dyn RecommendationEngine>` chosen at startup:
//! `AiAssistedEngine` when an Anthropic key is configured and AI recommendations
//! are enabled, `RuleBasedEngine` otherwise.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::profile::models::StudentProfile;
use crate::recommendation::models::RecommendationSet;
use crate::recommendation::pipeline::rule_based_set;
use crate::recommendation::prompts::{build_review_prompt, review_system_prompt, AiReview};
use crate::recommendation::scoring::MatchLevel;
use crate::reference::ReferenceCatalog;

const RULE_WEIGHT: f64 = 0.7;
const AI_WEIGHT: f64 = 0.3;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RecommendationEngine: Send + Sync {
    /// Stable identifier, stored with each run and used in cache keys.
    fn name(&self) -> &'static str;

    /// Whether a successful run from this engine is AI-enhanced.
    fn uses_ai(&self) -> bool {
        false
    }

    async fn recommend(
        &self,
        profile: &StudentProfile,
        catalog: &ReferenceCatalog,
        limit: usize,
    ) -> Result<RecommendationSet, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedEngine
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic scoring and enrichment over the reference catalogs. No network calls.
pub struct RuleBasedEngine;

impl RuleBasedEngine {
    pub const NAME: &'static str = "rule_based";
}

#[async_trait]
impl RecommendationEngine for RuleBasedEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn recommend(
        &self,
        profile: &StudentProfile,
        catalog: &ReferenceCatalog,
        limit: usize,
    ) -> Result<RecommendationSet, AppError> {
        Ok(rule_based_set(Self::NAME, profile, catalog, limit))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AiAssistedEngine
// ────────────────────────────────────────────────────────────────────────────

/// Rule-based shortlist, re-scored and explained by one LLM review.
pub struct AiAssistedEngine {
    llm: LlmClient,
}

impl AiAssistedEngine {
    pub const NAME: &'static str = "ai_assisted";

    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RecommendationEngine for AiAssistedEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn uses_ai(&self) -> bool {
        true
    }

    async fn recommend(
        &self,
        profile: &StudentProfile,
        catalog: &ReferenceCatalog,
        limit: usize,
    ) -> Result<RecommendationSet, AppError> {
        let base = rule_based_set(Self::NAME, profile, catalog, limit);
        if base.recommendations.is_empty() {
            debug!("Empty shortlist, skipping AI review");
            return Ok(base);
        }

        let prompt = build_review_prompt(profile, &base.recommendations);
        let system = review_system_prompt(profile);

        match self.llm.call_json::<AiReview>(&prompt, &system).await {
            Ok(review) => match apply_review(base.clone(), &review) {
                Some(set) => {
                    info!(
                        "AI review applied to {} of {} careers",
                        review.careers.len(),
                        set.recommendations.len()
                    );
                    Ok(set)
                }
                None => {
                    warn!("AI review referenced no shortlisted career, using rule-based results");
                    Ok(base)
                }
            },
            Err(e) => {
                warn!("AI review failed, using rule-based results: {e}");
                Ok(base)
            }
        }
    }
}

fn blend(rule_score: u32, ai_score: u32) -> u32 {
    (RULE_WEIGHT * f64::from(rule_score) + AI_WEIGHT * f64::from(ai_score))
        .round()
        .clamp(0.0, 100.0) as u32
}

/// Blends AI scores into the rule-based set and re-ranks it. Unknown career ids
/// and non-finite scores are ignored. Returns `None` when nothing was applied.
pub fn apply_review(mut set: RecommendationSet, review: &AiReview) -> Option<RecommendationSet> {
    let by_id: HashMap<&str, _> = review
        .careers
        .iter()
        .filter(|c| c.ai_score.is_finite())
        .map(|c| (c.career_id.as_str(), c))
        .collect();

    let mut applied = 0;
    for rec in &mut set.recommendations {
        let Some(entry) = by_id.get(rec.career_id.as_str()) else {
            continue;
        };
        let ai_score = entry.ai_score.clamp(0.0, 100.0).round() as u32;
        rec.ai_score = Some(ai_score);
        rec.match_score = blend(rec.rule_score, ai_score);
        rec.match_level = MatchLevel::from_score(rec.match_score);
        let rationale = entry.rationale.trim();
        if !rationale.is_empty() {
            rec.ai_rationale = Some(rationale.to_string());
        }
        applied += 1;
    }

    if applied == 0 {
        return None;
    }

    set.recommendations.sort_by(|a, b| match b.match_score.cmp(&a.match_score) {
        Ordering::Equal => a.title.cmp(&b.title),
        other => other,
    });
    for (i, rec) in set.recommendations.iter_mut().enumerate() {
        rec.rank = i as u32 + 1;
    }

    let summary = review.summary.trim();
    if !summary.is_empty() {
        set.summary = summary.to_string();
    }
    set.ai_enhanced = true;
    Some(set)
}

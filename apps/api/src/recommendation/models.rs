use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recommendation::scoring::{MatchLevel, ScoreBreakdown};
use crate::reference::models::{GrowthOutlook, Ownership, SalaryRange};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedCollege {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub ownership: Ownership,
    pub annual_fees: u64,
    pub rating: f32,
    /// Fees fit within the student's annual budget.
    pub affordable: bool,
    pub accepted_exams: Vec<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedScholarship {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub annual_amount: u64,
    pub deadline: Option<String>,
    pub url: Option<String>,
}

/// One scored and enriched career suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub rank: u32,
    pub career_id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub match_score: u32,
    pub match_level: MatchLevel,
    /// Rule-based score before any AI blending.
    pub rule_score: u32,
    pub ai_score: Option<u32>,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
    pub ai_rationale: Option<String>,
    pub education_path: Vec<String>,
    pub duration_years: u8,
    pub entrance_exams: Vec<String>,
    pub salary: SalaryRange,
    pub growth_outlook: GrowthOutlook,
    /// INR over the full course duration.
    pub estimated_total_cost: u64,
    pub colleges: Vec<MatchedCollege>,
    pub scholarships: Vec<MatchedScholarship>,
    pub next_steps: Vec<String>,
}

/// The output of one engine run, persisted as a recommendation run's `result`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet {
    pub engine: String,
    pub ai_enhanced: bool,
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationSet {
    pub fn contains_career(&self, career_id: &str) -> bool {
        self.recommendations.iter().any(|r| r.career_id == career_id)
    }
}

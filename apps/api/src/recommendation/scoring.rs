//! Match scoring: an additive, rule-based estimate of fit between a student and a career.
//!
//! | component   | max | driven by                                        |
//! |-------------|-----|--------------------------------------------------|
//! | interest    | 35  | share of the career's interest tags matched      |
//! | academic    | 25  | stream compatibility and aggregate percentage    |
//! | subjects    | 15  | scores in the career's key subjects              |
//! | aspiration  | 10  | preferred careers and their categories           |
//! | feasibility | 15  | cost against budget, course length against limit |
//!
//! Students at class 12 or above whose stream the career does not accept get the
//! sum multiplied by 0.6. The result is clamped to 0..=100 and rounded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::profile::models::{EducationLevel, StudentProfile};
use crate::recommendation::format_inr;
use crate::reference::models::Career;
use crate::reference::ReferenceCatalog;

pub const INTEREST_MAX: f64 = 35.0;
pub const ACADEMIC_MAX: f64 = 25.0;
pub const SUBJECTS_MAX: f64 = 15.0;
pub const ASPIRATION_MAX: f64 = 10.0;
pub const FEASIBILITY_MAX: f64 = 15.0;

const STREAM_POINTS: f64 = 10.0;
const PERCENTAGE_POINTS: f64 = 10.0;
const EXCELLENCE_BONUS: f64 = 5.0;
/// Percentage points above the minimum that earn the full excellence bonus.
const EXCELLENCE_MARGIN: f64 = 20.0;
const NO_SUBJECT_MATCH_POINTS: f64 = 5.0;
const SAME_CATEGORY_POINTS: f64 = 5.0;
const AFFORDABILITY_MAX: f64 = 10.0;
const SCHOLARSHIP_BONUS: f64 = 3.0;
const DURATION_POINTS: f64 = 5.0;
const STREAM_PENALTY: f64 = 0.6;
const STRONG_SUBJECT_SCORE: f32 = 75.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Low,
    Fair,
    Good,
    Excellent,
}

impl MatchLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => MatchLevel::Excellent,
            60..=79 => MatchLevel::Good,
            40..=59 => MatchLevel::Fair,
            _ => MatchLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::Excellent => "excellent",
            MatchLevel::Good => "good",
            MatchLevel::Fair => "fair",
            MatchLevel::Low => "low",
        }
    }
}

/// Per-component points, rounded to one decimal for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub interest: f64,
    pub academic: f64,
    pub subjects: f64,
    pub aspiration: f64,
    pub feasibility: f64,
    pub stream_penalty_applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareerScore {
    pub score: u32,
    pub level: MatchLevel,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
}

/// Student-side inputs shared by every career scored in one run.
pub struct ScoringContext<'a> {
    pub profile: &'a StudentProfile,
    pub budget: u64,
    interests: Vec<String>,
    preferred: HashSet<String>,
    preferred_categories: HashSet<String>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(profile: &'a StudentProfile, catalog: &ReferenceCatalog) -> Self {
        let interests = profile
            .aspirations
            .interests
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();

        let preferred: HashSet<String> = profile
            .aspirations
            .preferred_careers
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let preferred_categories = catalog
            .careers()
            .iter()
            .filter(|c| is_preferred(&preferred, c))
            .map(|c| c.category.to_lowercase())
            .collect();

        Self {
            profile,
            budget: profile.education_budget(),
            interests,
            preferred,
            preferred_categories,
        }
    }

    fn interest_matches(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        !tag.is_empty()
            && self
                .interests
                .iter()
                .any(|i| *i == tag || i.contains(&tag) || tag.contains(i.as_str()))
    }

    /// True when the career accepts the student's stream, or the student has not
    /// reached the point of choosing one.
    pub fn stream_compatible(&self, career: &Career) -> bool {
        let academic = &self.profile.academic;
        career.accepts_stream(academic.stream)
            || (academic.current_level < EducationLevel::Class12 && academic.stream.is_none())
    }
}

fn is_preferred(preferred: &HashSet<String>, career: &Career) -> bool {
    preferred.contains(&career.id.to_lowercase()) || preferred.contains(&career.title.to_lowercase())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn interest_component(ctx: &ScoringContext, career: &Career, reasons: &mut Vec<String>) -> f64 {
    if career.interest_tags.is_empty() {
        return 0.0;
    }
    let matched: Vec<String> = career
        .interest_tags
        .iter()
        .filter(|tag| ctx.interest_matches(tag))
        .cloned()
        .collect();
    if !matched.is_empty() {
        reasons.push(format!("Matches your interest in {}", join_names(&matched)));
    }
    matched.len() as f64 / career.interest_tags.len() as f64 * INTEREST_MAX
}

fn academic_component(ctx: &ScoringContext, career: &Career, reasons: &mut Vec<String>) -> f64 {
    let pct = f64::from(ctx.profile.academic.percentage);
    let min = f64::from(career.min_percentage);

    let stream_points = if ctx.stream_compatible(career) {
        STREAM_POINTS
    } else {
        let streams: Vec<&str> = career.required_streams.iter().map(|s| s.as_str()).collect();
        reasons.push(format!(
            "Usually entered from the {} stream",
            streams.join(" or ")
        ));
        0.0
    };

    let percentage_points = if pct >= min {
        reasons.push(format!("Your {pct:.0}% meets the typical {min:.0}% requirement"));
        PERCENTAGE_POINTS + EXCELLENCE_BONUS * ((pct - min) / EXCELLENCE_MARGIN).min(1.0)
    } else {
        reasons.push(format!("Your {pct:.0}% is below the typical {min:.0}% requirement"));
        PERCENTAGE_POINTS * pct / min
    };

    stream_points + percentage_points
}

fn subjects_component(ctx: &ScoringContext, career: &Career, reasons: &mut Vec<String>) -> f64 {
    let matched: Vec<_> = ctx
        .profile
        .academic
        .subjects
        .iter()
        .filter(|s| {
            career
                .key_subjects
                .iter()
                .any(|k| k.eq_ignore_ascii_case(s.name.trim()))
        })
        .collect();

    if matched.is_empty() {
        return NO_SUBJECT_MATCH_POINTS;
    }

    let strong: Vec<String> = matched
        .iter()
        .filter(|s| s.score >= STRONG_SUBJECT_SCORE)
        .map(|s| s.name.clone())
        .collect();
    if !strong.is_empty() {
        reasons.push(format!("Strong scores in {}", join_names(&strong)));
    }

    let mean = matched.iter().map(|s| f64::from(s.score)).sum::<f64>() / matched.len() as f64;
    mean * SUBJECTS_MAX / 100.0
}

fn aspiration_component(ctx: &ScoringContext, career: &Career, reasons: &mut Vec<String>) -> f64 {
    if is_preferred(&ctx.preferred, career) {
        reasons.push("One of your preferred careers".to_string());
        ASPIRATION_MAX
    } else if ctx
        .preferred_categories
        .contains(&career.category.to_lowercase())
    {
        reasons.push("Related to careers you prefer".to_string());
        SAME_CATEGORY_POINTS
    } else {
        0.0
    }
}

fn feasibility_component(
    ctx: &ScoringContext,
    career: &Career,
    scholarship_eligible: bool,
    reasons: &mut Vec<String>,
) -> f64 {
    let cost = career.annual_education_cost;
    let mut affordability = if cost <= ctx.budget {
        reasons.push(format!(
            "Typical annual cost of ₹{} fits your budget",
            format_inr(cost)
        ));
        AFFORDABILITY_MAX
    } else {
        reasons.push(format!(
            "Typical annual cost of ₹{} exceeds your budget of ₹{}",
            format_inr(cost),
            format_inr(ctx.budget)
        ));
        AFFORDABILITY_MAX * ctx.budget as f64 / cost as f64
    };

    if ctx.profile.constraints.needs_scholarship && scholarship_eligible {
        reasons.push("You qualify for scholarships in this field".to_string());
        affordability = (affordability + SCHOLARSHIP_BONUS).min(AFFORDABILITY_MAX);
    }

    let duration = match ctx.profile.constraints.max_study_years {
        Some(max) if career.duration_years > max => {
            reasons.push(format!(
                "Takes about {} years, longer than your limit of {max}",
                career.duration_years
            ));
            0.0
        }
        _ => DURATION_POINTS,
    };

    affordability + duration
}

/// Scores one career. `scholarship_eligible` says whether any scholarship
/// matched the student for this career.
pub fn score_career(ctx: &ScoringContext, career: &Career, scholarship_eligible: bool) -> CareerScore {
    let mut reasons = Vec::new();

    let interest = interest_component(ctx, career, &mut reasons);
    let academic = academic_component(ctx, career, &mut reasons);
    let subjects = subjects_component(ctx, career, &mut reasons);
    let aspiration = aspiration_component(ctx, career, &mut reasons);
    let feasibility = feasibility_component(ctx, career, scholarship_eligible, &mut reasons);

    let stream_penalty_applied = !ctx.stream_compatible(career)
        && ctx.profile.academic.current_level >= EducationLevel::Class12;

    let mut total = interest + academic + subjects + aspiration + feasibility;
    if stream_penalty_applied {
        total *= STREAM_PENALTY;
    }
    let score = total.clamp(0.0, 100.0).round() as u32;

    CareerScore {
        score,
        level: MatchLevel::from_score(score),
        breakdown: ScoreBreakdown {
            interest: round1(interest),
            academic: round1(academic),
            subjects: round1(subjects),
            aspiration: round1(aspiration),
            feasibility: round1(feasibility),
            stream_penalty_applied,
        },
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{sample_profile, Stream};
    use crate::reference::test_catalog;

    fn score(profile: &StudentProfile, career_id: &str, scholarship_eligible: bool) -> CareerScore {
        let catalog = test_catalog();
        let ctx = ScoringContext::new(profile, &catalog);
        let career = catalog.career(career_id).unwrap();
        score_career(&ctx, career, scholarship_eligible)
    }

    #[test]
    fn test_strong_fit_scores_excellent() {
        let result = score(&sample_profile(), "software-engineer", false);
        // 21 interest + 25 academic + 13.6 subjects + 10 aspiration + 15 feasibility
        assert_eq!(result.score, 85);
        assert_eq!(result.level, MatchLevel::Excellent);
        assert_eq!(result.breakdown.interest, 21.0);
        assert_eq!(result.breakdown.academic, 25.0);
        assert_eq!(result.breakdown.subjects, 13.6);
        assert!(!result.breakdown.stream_penalty_applied);
        assert!(result.reasons.iter().any(|r| r.contains("coding")));
    }

    #[test]
    fn test_incompatible_stream_is_penalised() {
        let mut profile = sample_profile();
        profile.academic.stream = Some(Stream::Arts);
        let result = score(&profile, "software-engineer", false);
        // (21 + 15 + 13.6 + 10 + 15) * 0.6 = 44.76
        assert_eq!(result.score, 45);
        assert_eq!(result.level, MatchLevel::Fair);
        assert!(result.breakdown.stream_penalty_applied);
    }

    #[test]
    fn test_class_10_without_stream_is_not_penalised() {
        let mut profile = sample_profile();
        profile.academic.current_level = EducationLevel::Class10;
        profile.academic.stream = None;
        let result = score(&profile, "software-engineer", false);
        assert!(!result.breakdown.stream_penalty_applied);
        assert_eq!(result.breakdown.academic, 25.0);
    }

    #[test]
    fn test_below_minimum_percentage_scales_down() {
        let mut profile = sample_profile();
        profile.academic.percentage = 60.0;
        let result = score(&profile, "doctor-mbbs", false);
        // stream 10 + 10 * 60 / 75
        assert_eq!(result.breakdown.academic, 18.0);
        assert!(result.reasons.iter().any(|r| r.contains("below")));
    }

    #[test]
    fn test_unmatched_subjects_get_floor_points() {
        let result = score(&sample_profile(), "lawyer", false);
        assert_eq!(result.breakdown.subjects, 5.0);
    }

    #[test]
    fn test_aspiration_same_category() {
        let profile = sample_profile();
        assert_eq!(score(&profile, "data-scientist", false).breakdown.aspiration, 5.0);
        assert_eq!(score(&profile, "lawyer", false).breakdown.aspiration, 0.0);

        let mut by_title = sample_profile();
        by_title.aspirations.preferred_careers = vec!["Registered Nurse".to_string()];
        assert_eq!(score(&by_title, "nurse", false).breakdown.aspiration, 10.0);
    }

    #[test]
    fn test_affordability_with_scholarship_bonus() {
        let mut profile = sample_profile();
        profile.constraints.max_annual_budget = Some(100_000);
        // software engineering costs 200000 a year: 10 * 0.5 + duration 5
        assert_eq!(score(&profile, "software-engineer", true).breakdown.feasibility, 10.0);

        profile.constraints.needs_scholarship = true;
        assert_eq!(score(&profile, "software-engineer", false).breakdown.feasibility, 10.0);
        assert_eq!(score(&profile, "software-engineer", true).breakdown.feasibility, 13.0);

        profile.constraints.max_annual_budget = Some(180_000);
        // 9 + 3 is capped at 10
        assert_eq!(score(&profile, "software-engineer", true).breakdown.feasibility, 15.0);
    }

    #[test]
    fn test_course_longer_than_limit_loses_duration_points() {
        let mut profile = sample_profile();
        profile.constraints.max_study_years = Some(3);
        let result = score(&profile, "software-engineer", false);
        assert_eq!(result.breakdown.feasibility, 10.0);
        assert!(result.reasons.iter().any(|r| r.contains("longer than")));
    }

    #[test]
    fn test_interest_containment_matches() {
        let mut profile = sample_profile();
        profile.aspirations.interests = vec!["Computer".to_string()];
        // "computer" is contained in the "computers" tag: 1 of 5 tags
        assert_eq!(score(&profile, "software-engineer", false).breakdown.interest, 7.0);
    }

    #[test]
    fn test_match_level_thresholds() {
        assert_eq!(MatchLevel::from_score(100), MatchLevel::Excellent);
        assert_eq!(MatchLevel::from_score(80), MatchLevel::Excellent);
        assert_eq!(MatchLevel::from_score(79), MatchLevel::Good);
        assert_eq!(MatchLevel::from_score(60), MatchLevel::Good);
        assert_eq!(MatchLevel::from_score(40), MatchLevel::Fair);
        assert_eq!(MatchLevel::from_score(39), MatchLevel::Low);
        assert_eq!(MatchLevel::from_score(0), MatchLevel::Low);
    }
}

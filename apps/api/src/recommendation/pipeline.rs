use chrono::Utc;

use crate::profile::models::StudentProfile;
use crate::recommendation::format_inr;
use crate::recommendation::matching::{match_colleges, match_scholarships, scholarship_eligible};
use crate::recommendation::models::{
    MatchedCollege, MatchedScholarship, Recommendation, RecommendationSet,
};
use crate::recommendation::scoring::{score_career, CareerScore, MatchLevel, ScoringContext};
use crate::reference::models::Career;
use crate::reference::ReferenceCatalog;

/// Careers scoring below this are not recommended at all.
pub const MIN_MATCH_SCORE: u32 = 25;
const MAX_EXAM_STEPS: usize = 2;
const MAX_SKILL_STEPS: usize = 3;

/// Scores every career, drops weak matches, and returns the best `limit`, ranked.
pub fn rank_careers(
    profile: &StudentProfile,
    catalog: &ReferenceCatalog,
    limit: usize,
) -> Vec<Recommendation> {
    let ctx = ScoringContext::new(profile, catalog);

    let mut scored: Vec<(&Career, CareerScore)> = catalog
        .careers()
        .iter()
        .map(|career| {
            let eligible = catalog
                .scholarships()
                .iter()
                .any(|s| scholarship_eligible(&ctx, s, career));
            (career, score_career(&ctx, career, eligible))
        })
        .filter(|(_, score)| score.score >= MIN_MATCH_SCORE)
        .collect();

    scored.sort_by(|(a_career, a), (b_career, b)| {
        b.score
            .cmp(&a.score)
            .then_with(|| a_career.title.cmp(&b_career.title))
    });

    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (career, score))| enrich(&ctx, catalog, career, score, i as u32 + 1))
        .collect()
}

fn enrich(
    ctx: &ScoringContext,
    catalog: &ReferenceCatalog,
    career: &Career,
    score: CareerScore,
    rank: u32,
) -> Recommendation {
    let colleges = match_colleges(ctx, catalog, career);
    let scholarships = match_scholarships(ctx, catalog, career);
    let next_steps = next_steps(ctx, career, &colleges, &scholarships);

    Recommendation {
        rank,
        career_id: career.id.clone(),
        title: career.title.clone(),
        category: career.category.clone(),
        description: career.description.clone(),
        match_score: score.score,
        match_level: score.level,
        rule_score: score.score,
        ai_score: None,
        breakdown: score.breakdown,
        reasons: score.reasons,
        ai_rationale: None,
        education_path: career.education_path.clone(),
        duration_years: career.duration_years,
        entrance_exams: career.entrance_exams.clone(),
        salary: career.salary,
        growth_outlook: career.growth_outlook,
        estimated_total_cost: career.total_education_cost(),
        colleges,
        scholarships,
        next_steps,
    }
}

/// Concrete actions: exams to prepare for, scholarships to apply to, skills to build.
pub fn next_steps(
    ctx: &ScoringContext,
    career: &Career,
    colleges: &[MatchedCollege],
    scholarships: &[MatchedScholarship],
) -> Vec<String> {
    let mut steps = Vec::new();

    let percentage = ctx.profile.academic.percentage;
    if percentage < career.min_percentage {
        steps.push(format!(
            "Work towards at least {:.0}% in your board exams",
            career.min_percentage
        ));
    }

    for exam in career.entrance_exams.iter().take(MAX_EXAM_STEPS) {
        steps.push(format!("Prepare for {exam}"));
    }

    for scholarship in scholarships {
        match &scholarship.deadline {
            Some(deadline) => steps.push(format!(
                "Apply for {} (deadline: {deadline})",
                scholarship.name
            )),
            None => steps.push(format!("Apply for {}", scholarship.name)),
        }
    }

    if !colleges.is_empty() && colleges.iter().all(|c| !c.affordable) && scholarships.is_empty() {
        steps.push(format!(
            "Explore education loans: matched colleges cost more than ₹{} a year",
            format_inr(ctx.budget)
        ));
    }

    let skills: Vec<&str> = career
        .skills
        .iter()
        .take(MAX_SKILL_STEPS)
        .map(String::as_str)
        .collect();
    if !skills.is_empty() {
        steps.push(format!("Start building skills in {}", skills.join(", ")));
    }

    steps
}

pub fn rule_based_summary(recommendations: &[Recommendation]) -> String {
    match recommendations.first() {
        None => "No career matched your profile strongly enough. Try adding more interests, \
                 widening the states you would study in, or talk to a counselor."
            .to_string(),
        Some(top) => {
            let strong = recommendations
                .iter()
                .filter(|r| r.match_level >= MatchLevel::Good)
                .count();
            format!(
                "Your strongest match is {} ({}/100). We found {} suitable career{}, \
                 {} of them a good or excellent fit.",
                top.title,
                top.match_score,
                recommendations.len(),
                if recommendations.len() == 1 { "" } else { "s" },
                strong
            )
        }
    }
}

pub fn rule_based_set(
    engine: &str,
    profile: &StudentProfile,
    catalog: &ReferenceCatalog,
    limit: usize,
) -> RecommendationSet {
    let recommendations = rank_careers(profile, catalog, limit);
    RecommendationSet {
        engine: engine.to_string(),
        ai_enhanced: false,
        summary: rule_based_summary(&recommendations),
        recommendations,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{sample_profile, Stream};
    use crate::reference::test_catalog;

    #[test]
    fn test_ranked_by_score_then_title() {
        let recs = rank_careers(&sample_profile(), &test_catalog(), 20);
        assert!(!recs.is_empty());
        assert_eq!(recs[0].career_id, "software-engineer");
        for (i, pair) in recs.windows(2).enumerate() {
            assert_eq!(pair[0].rank, i as u32 + 1);
            assert!(
                pair[0].match_score > pair[1].match_score
                    || (pair[0].match_score == pair[1].match_score && pair[0].title <= pair[1].title)
            );
        }
        assert!(recs.iter().all(|r| r.match_score >= MIN_MATCH_SCORE));
    }

    #[test]
    fn test_limit_is_respected() {
        let recs = rank_careers(&sample_profile(), &test_catalog(), 2);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].rank, 2);
    }

    #[test]
    fn test_recommendation_is_enriched() {
        let recs = rank_careers(&sample_profile(), &test_catalog(), 1);
        let top = &recs[0];
        assert_eq!(top.rule_score, top.match_score);
        assert_eq!(top.estimated_total_cost, 800_000);
        assert_eq!(top.colleges.len(), 3);
        assert!(!top.scholarships.is_empty());
        assert!(top.next_steps.iter().any(|s| s == "Prepare for JEE Main"));
        assert!(top
            .next_steps
            .iter()
            .any(|s| s.starts_with("Apply for Reliance Foundation")));
    }

    #[test]
    fn test_weak_profile_can_yield_empty_set() {
        let mut profile = sample_profile();
        profile.academic.stream = Some(Stream::Vocational);
        profile.academic.percentage = 5.0;
        profile.academic.subjects.clear();
        profile.aspirations.interests = vec!["underwater basket weaving".to_string()];
        profile.aspirations.preferred_careers.clear();
        profile.constraints.max_annual_budget = Some(1_000);
        profile.constraints.max_study_years = Some(1);

        let set = rule_based_set("rule_based", &profile, &test_catalog(), 5);
        assert!(set.recommendations.is_empty());
        assert!(set.summary.contains("No career matched"));
        assert!(!set.ai_enhanced);
    }

    #[test]
    fn test_summary_mentions_top_match() {
        let recs = rank_careers(&sample_profile(), &test_catalog(), 3);
        let summary = rule_based_summary(&recs);
        assert!(summary.contains("Software Engineer"));
        assert!(summary.contains("3 suitable careers"));
    }
}

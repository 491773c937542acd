use std::cmp::Ordering;

use crate::recommendation::models::{MatchedCollege, MatchedScholarship};
use crate::recommendation::scoring::ScoringContext;
use crate::reference::models::{Career, College, Scholarship};
use crate::reference::ReferenceCatalog;

pub const MAX_COLLEGES_PER_CAREER: usize = 3;
pub const MAX_SCHOLARSHIPS_PER_CAREER: usize = 3;

fn state_allowed(allowed: Option<&[String]>, state: &str) -> bool {
    allowed.map_or(true, |states| {
        states.iter().any(|s| s.trim().eq_ignore_ascii_case(state.trim()))
    })
}

/// Colleges offering the career that admit the student and sit in an acceptable state.
/// Affordable ones first, then by rating, then by name.
pub fn match_colleges(
    ctx: &ScoringContext,
    catalog: &ReferenceCatalog,
    career: &Career,
) -> Vec<MatchedCollege> {
    let acceptable_states = ctx.profile.acceptable_states();
    let percentage = ctx.profile.academic.percentage;

    let mut eligible: Vec<&College> = catalog
        .colleges_for_career(&career.id)
        .filter(|c| percentage >= c.min_percentage)
        .filter(|c| state_allowed(acceptable_states.as_deref(), &c.state))
        .collect();

    eligible.sort_by(|a, b| {
        let a_affordable = a.annual_fees <= ctx.budget;
        let b_affordable = b.annual_fees <= ctx.budget;
        b_affordable
            .cmp(&a_affordable)
            .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
            .then_with(|| a.name.cmp(&b.name))
    });

    eligible
        .into_iter()
        .take(MAX_COLLEGES_PER_CAREER)
        .map(|c| MatchedCollege {
            id: c.id.clone(),
            name: c.name.clone(),
            city: c.city.clone(),
            state: c.state.clone(),
            ownership: c.ownership,
            annual_fees: c.annual_fees,
            rating: c.rating,
            affordable: c.annual_fees <= ctx.budget,
            accepted_exams: c.accepted_exams.clone(),
            website: c.website.clone(),
        })
        .collect()
}

pub fn scholarship_eligible(ctx: &ScoringContext, scholarship: &Scholarship, career: &Career) -> bool {
    let profile = ctx.profile;
    let socio = &profile.socioeconomic;

    let category_ok = scholarship.eligible_categories.is_empty()
        || scholarship.eligible_categories.contains(&socio.category);
    let income_ok = scholarship
        .max_family_income
        .map_or(true, |max| socio.annual_family_income <= max);
    let percentage_ok = profile.academic.percentage >= scholarship.min_percentage;
    let level_ok = scholarship.eligible_levels.is_empty()
        || scholarship
            .eligible_levels
            .contains(&profile.academic.current_level);
    let state_ok = scholarship.eligible_states.is_empty()
        || state_allowed(Some(scholarship.eligible_states.as_slice()), &profile.personal.state);
    let gender_ok = scholarship
        .gender
        .map_or(true, |g| profile.personal.gender == Some(g));
    let first_gen_ok = !scholarship.first_generation_only || socio.first_generation_learner;
    let career_ok = scholarship.career_categories.is_empty()
        || scholarship
            .career_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&career.category));

    category_ok
        && income_ok
        && percentage_ok
        && level_ok
        && state_ok
        && gender_ok
        && first_gen_ok
        && career_ok
}

/// Scholarships the student qualifies for while pursuing this career, largest first.
pub fn match_scholarships(
    ctx: &ScoringContext,
    catalog: &ReferenceCatalog,
    career: &Career,
) -> Vec<MatchedScholarship> {
    let mut eligible: Vec<&Scholarship> = catalog
        .scholarships()
        .iter()
        .filter(|s| scholarship_eligible(ctx, s, career))
        .collect();

    eligible.sort_by(|a, b| {
        b.annual_amount
            .cmp(&a.annual_amount)
            .then_with(|| a.name.cmp(&b.name))
    });

    eligible
        .into_iter()
        .take(MAX_SCHOLARSHIPS_PER_CAREER)
        .map(|s| MatchedScholarship {
            id: s.id.clone(),
            name: s.name.clone(),
            provider: s.provider.clone(),
            annual_amount: s.annual_amount,
            deadline: s.deadline.clone(),
            url: s.url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{sample_profile, Gender, SocialCategory, StudentProfile};
    use crate::reference::test_catalog;

    fn college_ids(profile: &StudentProfile, career_id: &str) -> Vec<String> {
        let catalog = test_catalog();
        let ctx = ScoringContext::new(profile, &catalog);
        match_colleges(&ctx, &catalog, catalog.career(career_id).unwrap())
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    fn scholarship_ids(profile: &StudentProfile, career_id: &str) -> Vec<String> {
        let catalog = test_catalog();
        let ctx = ScoringContext::new(profile, &catalog);
        match_scholarships(&ctx, &catalog, catalog.career(career_id).unwrap())
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn test_colleges_sorted_affordable_first_then_rating() {
        // Budget 250000: IIT Madras (220000, 4.9), NIT Trichy (150000, 4.6),
        // CEG (50000, 4.4) are affordable; RVCE (300000) is not.
        let ids = college_ids(&sample_profile(), "software-engineer");
        assert_eq!(ids, vec!["iit-madras", "nit-trichy", "anna-university-ceg"]);
    }

    #[test]
    fn test_unaffordable_colleges_rank_last() {
        let mut profile = sample_profile();
        profile.constraints.max_annual_budget = Some(100_000);
        let ids = college_ids(&profile, "software-engineer");
        assert_eq!(ids[0], "anna-university-ceg");
        assert_eq!(ids.len(), MAX_COLLEGES_PER_CAREER);
    }

    #[test]
    fn test_colleges_respect_location_and_percentage() {
        let mut profile = sample_profile();
        profile.constraints.willing_to_relocate = false;
        profile.academic.percentage = 72.0;
        // Home state only, and IIT / NIT need 75%.
        let ids = college_ids(&profile, "software-engineer");
        assert_eq!(ids, vec!["anna-university-ceg"]);

        profile.constraints.preferred_states = vec!["karnataka".to_string()];
        let ids = college_ids(&profile, "software-engineer");
        assert_eq!(ids, vec!["rv-college-of-engineering"]);
    }

    #[test]
    fn test_scholarships_follow_eligibility_rules() {
        // Female, OBC, 88%, income 600000, Tamil Nadu, not first generation.
        let ids = scholarship_ids(&sample_profile(), "software-engineer");
        assert_eq!(
            ids,
            vec!["reliance-foundation-ug", "inspire-she", "aicte-pragati"]
        );

        let mut profile = sample_profile();
        profile.personal.gender = Some(Gender::Male);
        let ids = scholarship_ids(&profile, "software-engineer");
        assert!(!ids.contains(&"aicte-pragati".to_string()));
    }

    #[test]
    fn test_scholarship_category_income_and_first_generation() {
        let mut profile = sample_profile();
        profile.socioeconomic.category = SocialCategory::Sc;
        profile.socioeconomic.annual_family_income = 200_000;
        profile.socioeconomic.first_generation_learner = true;
        profile.personal.gender = Some(Gender::Male);
        profile.academic.percentage = 70.0;

        let ids = scholarship_ids(&profile, "civil-engineer");
        assert_eq!(
            ids,
            vec!["reliance-foundation-ug", "post-matric-sc", "tn-first-graduate"]
        );

        // Career-category restriction: the TN first graduate scheme excludes law.
        let ids = scholarship_ids(&profile, "lawyer");
        assert!(!ids.contains(&"tn-first-graduate".to_string()));
        assert!(ids.contains(&"keep-india-smiling-law".to_string()));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::llm_client::prompts::{
    language_instruction, system_prompt, GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM,
};
use crate::profile::models::StudentProfile;
use crate::recommendation::models::Recommendation;

const COUNSELOR_ROLE: &str = "\
    You are an experienced career counselor for Indian school and college students. \
    You review a shortlist of careers that a scoring model produced for one student \
    and judge how well each fits the student's interests, academics, finances and goals.";

/// What the model returns for a shortlist review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReview {
    pub summary: String,
    pub careers: Vec<AiCareerReview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiCareerReview {
    pub career_id: String,
    /// 0 to 100.
    pub ai_score: f64,
    pub rationale: String,
}

pub fn review_system_prompt(profile: &StudentProfile) -> String {
    let language = language_instruction(profile.personal.preferred_language.display_name());
    system_prompt(&[JSON_ONLY_SYSTEM, COUNSELOR_ROLE, GROUNDING_INSTRUCTION, &language])
}

/// The student summary leaves out name and district.
pub fn build_review_prompt(profile: &StudentProfile, shortlist: &[Recommendation]) -> String {
    let student = json!({
        "age": profile.personal.age,
        "state": profile.personal.state,
        "area_type": profile.personal.area_type,
        "education_level": profile.academic.current_level,
        "stream": profile.academic.stream,
        "percentage": profile.academic.percentage,
        "subjects": profile.academic.subjects,
        "entrance_exams": profile.academic.entrance_exams,
        "first_generation_learner": profile.socioeconomic.first_generation_learner,
        "interests": profile.aspirations.interests,
        "preferred_careers": profile.aspirations.preferred_careers,
        "career_goals": profile.aspirations.career_goals,
        "work_style": profile.aspirations.work_style,
        "annual_education_budget_inr": profile.education_budget(),
        "willing_to_relocate": profile.constraints.willing_to_relocate,
        "needs_scholarship": profile.constraints.needs_scholarship,
    });

    let candidates: Vec<_> = shortlist
        .iter()
        .map(|r| {
            json!({
                "career_id": r.career_id,
                "title": r.title,
                "category": r.category,
                "rule_score": r.rule_score,
                "reasons": r.reasons,
                "duration_years": r.duration_years,
                "estimated_total_cost_inr": r.estimated_total_cost,
            })
        })
        .collect();

    format!(
        r#"STUDENT:
{student}

SHORTLISTED CAREERS:
{candidates}

TASK:
For each shortlisted career, give an independent fit score from 0 to 100 and a
two or three sentence rationale addressed to the student. Then write a short
overall summary (at most four sentences) with encouragement and one concrete
next step.

Return this JSON shape exactly:
{{
  "summary": "...",
  "careers": [
    {{"career_id": "<id from the shortlist>", "ai_score": 0, "rationale": "..."}}
  ]
}}"#,
        student = serde_json::to_string_pretty(&student).unwrap_or_default(),
        candidates = serde_json::to_string_pretty(&candidates).unwrap_or_default(),
    )
}

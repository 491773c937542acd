//! Per-step validation for the multi-step profile form.
//!
//! Each step payload is deserialized into its typed section, sanitised, and checked.
//! Only the sanitised form is ever persisted.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{AppError, FieldError};
use crate::profile::models::{
    AcademicInfo, Aspirations, EducationLevel, FormStep, PersonalInfo, SocioeconomicInfo,
    StudentProfile, StudyConstraints,
};
use crate::validation::{sanitize_list, sanitize_optional, sanitize_text, FieldErrors};

const NAME_MAX: usize = 100;
const PLACE_MAX: usize = 80;
const TAG_MAX: usize = 60;
const GOALS_MAX: usize = 1000;
const MAX_SUBJECTS: usize = 15;
const MAX_EXAMS: usize = 10;
const MAX_INTERESTS: usize = 10;
const MAX_PREFERRED_CAREERS: usize = 5;
const MAX_PREFERRED_STATES: usize = 10;
const MAX_SIBLINGS: u8 = 15;
/// 10 crore INR; anything above is a data-entry error.
const MAX_INCOME: u64 = 1_000_000_000;

/// A single section of the intake form.
pub trait FormSection: Sized + Serialize + DeserializeOwned {
    const STEP: FormStep;

    /// Returns the section with all free text cleaned.
    fn sanitize(self) -> Self;

    /// Records every rule the (sanitised) section violates.
    fn check(&self, errors: &mut FieldErrors);
}

/// Deserializes, sanitises, and validates one step payload.
pub fn normalize<T: FormSection>(payload: Value) -> Result<T, AppError> {
    let section: T = serde_json::from_value(payload).map_err(|e| {
        AppError::Validation(format!("Invalid {} step payload: {e}", T::STEP))
    })?;
    let section = section.sanitize();

    let mut errors = FieldErrors::new();
    section.check(&mut errors);
    errors.into_result()?;

    Ok(section)
}

/// Normalizes a step payload by step name and returns the JSON to persist.
pub fn normalize_step(step: FormStep, payload: Value) -> Result<Value, AppError> {
    let value = match step {
        FormStep::Personal => serde_json::to_value(normalize::<PersonalInfo>(payload)?),
        FormStep::Academic => serde_json::to_value(normalize::<AcademicInfo>(payload)?),
        FormStep::Socioeconomic => serde_json::to_value(normalize::<SocioeconomicInfo>(payload)?),
        FormStep::Aspirations => serde_json::to_value(normalize::<Aspirations>(payload)?),
        FormStep::Constraints => serde_json::to_value(normalize::<StudyConstraints>(payload)?),
    };
    value.map_err(|e| AppError::Internal(e.into()))
}

impl FormSection for PersonalInfo {
    const STEP: FormStep = FormStep::Personal;

    fn sanitize(self) -> Self {
        Self {
            full_name: sanitize_text(&self.full_name, NAME_MAX),
            state: sanitize_text(&self.state, PLACE_MAX),
            district: sanitize_optional(self.district.as_deref(), PLACE_MAX),
            ..self
        }
    }

    fn check(&self, errors: &mut FieldErrors) {
        errors.length("full_name", &self.full_name, 2, NAME_MAX);
        errors.range("age", self.age, 10, 40);
        errors.require("state", &self.state);
    }
}

impl FormSection for AcademicInfo {
    const STEP: FormStep = FormStep::Academic;

    fn sanitize(mut self) -> Self {
        self.board = sanitize_optional(self.board.as_deref(), PLACE_MAX);
        for subject in &mut self.subjects {
            subject.name = sanitize_text(&subject.name, TAG_MAX);
        }
        self.subjects.retain(|s| !s.name.is_empty());
        for exam in &mut self.entrance_exams {
            exam.exam = sanitize_text(&exam.exam, TAG_MAX);
        }
        self.entrance_exams.retain(|e| !e.exam.is_empty());
        self
    }

    fn check(&self, errors: &mut FieldErrors) {
        errors.range("percentage", self.percentage, 0.0, 100.0);
        errors.max_items("subjects", &self.subjects, MAX_SUBJECTS);
        errors.max_items("entrance_exams", &self.entrance_exams, MAX_EXAMS);
        for (i, subject) in self.subjects.iter().enumerate() {
            errors.range(&format!("subjects[{i}].score"), subject.score, 0.0, 100.0);
        }
        for (i, exam) in self.entrance_exams.iter().enumerate() {
            errors.range(
                &format!("entrance_exams[{i}].percentile"),
                exam.percentile,
                0.0,
                100.0,
            );
        }
        if self.current_level >= EducationLevel::Class12 && self.stream.is_none() {
            errors.push("stream", "is required from class 12 onwards");
        }
    }
}

impl FormSection for SocioeconomicInfo {
    const STEP: FormStep = FormStep::Socioeconomic;

    fn sanitize(self) -> Self {
        self
    }

    fn check(&self, errors: &mut FieldErrors) {
        errors.range("annual_family_income", self.annual_family_income, 0, MAX_INCOME);
        errors.range("siblings", self.siblings, 0, MAX_SIBLINGS);
    }
}

impl FormSection for Aspirations {
    const STEP: FormStep = FormStep::Aspirations;

    fn sanitize(self) -> Self {
        Self {
            // Caps are applied after validation so oversize lists are reported, not silently cut.
            interests: sanitize_list(&self.interests, usize::MAX, TAG_MAX),
            preferred_careers: sanitize_list(&self.preferred_careers, usize::MAX, TAG_MAX),
            career_goals: sanitize_optional(self.career_goals.as_deref(), GOALS_MAX),
            ..self
        }
    }

    fn check(&self, errors: &mut FieldErrors) {
        if self.interests.is_empty() {
            errors.push("interests", "select at least one interest");
        }
        errors.max_items("interests", &self.interests, MAX_INTERESTS);
        errors.max_items(
            "preferred_careers",
            &self.preferred_careers,
            MAX_PREFERRED_CAREERS,
        );
    }
}

impl FormSection for StudyConstraints {
    const STEP: FormStep = FormStep::Constraints;

    fn sanitize(self) -> Self {
        Self {
            preferred_states: sanitize_list(&self.preferred_states, usize::MAX, PLACE_MAX),
            ..self
        }
    }

    fn check(&self, errors: &mut FieldErrors) {
        errors.max_items(
            "preferred_states",
            &self.preferred_states,
            MAX_PREFERRED_STATES,
        );
        if let Some(years) = self.max_study_years {
            errors.range("max_study_years", years, 1, 10);
        }
        if let Some(budget) = self.max_annual_budget {
            errors.range("max_annual_budget", budget, 0, MAX_INCOME);
        }
    }
}

/// Checks that only make sense once every step is present.
/// Returns (blocking errors, advisory warnings).
pub fn check_cross_step(profile: &StudentProfile) -> (Vec<FieldError>, Vec<String>) {
    let mut errors = FieldErrors::new();
    let mut warnings = Vec::new();

    let level = profile.academic.current_level;
    let age = profile.personal.age;
    if level >= EducationLevel::Undergraduate && age < 16 {
        errors.push(
            "personal.age",
            format!("age {age} is too low for {} studies", level.as_str()),
        );
    }

    if let Some(budget) = profile.constraints.max_annual_budget {
        let income = profile.socioeconomic.annual_family_income;
        if income > 0 && budget > income {
            warnings.push(format!(
                "Education budget (₹{budget}) exceeds annual family income (₹{income}); \
                 scholarship and loan options will be emphasised."
            ));
        }
    }

    if profile.constraints.needs_scholarship && profile.socioeconomic.annual_family_income > 2_500_000
    {
        warnings.push(
            "Most need-based scholarships cap family income well below the reported figure."
                .to_string(),
        );
    }

    (errors.into_vec(), warnings)
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    Urban,
    SemiUrban,
    Rural,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
    Te,
    Bn,
    Mr,
}

impl Language {
    /// English name of the language, used when instructing the LLM.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Ta => "Tamil",
            Language::Te => "Telugu",
            Language::Bn => "Bengali",
            Language::Mr => "Marathi",
        }
    }
}

/// Ordered: later variants are further along the education ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EducationLevel {
    #[serde(rename = "class_10")]
    Class10,
    #[serde(rename = "class_12")]
    Class12,
    #[serde(rename = "undergraduate")]
    Undergraduate,
    #[serde(rename = "postgraduate")]
    Postgraduate,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Class10 => "class_10",
            EducationLevel::Class12 => "class_12",
            EducationLevel::Undergraduate => "undergraduate",
            EducationLevel::Postgraduate => "postgraduate",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Science,
    Commerce,
    Arts,
    Vocational,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Science => "science",
            Stream::Commerce => "commerce",
            Stream::Arts => "arts",
            Stream::Vocational => "vocational",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SocialCategory {
    General,
    Obc,
    Sc,
    St,
    Ews,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkStyle {
    Independent,
    Collaborative,
    Creative,
    Analytical,
    HandsOn,
    PeopleFacing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalInfo {
    pub full_name: String,
    pub age: u8,
    pub gender: Option<Gender>,
    pub state: String,
    pub district: Option<String>,
    pub area_type: AreaType,
    #[serde(default)]
    pub preferred_language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectScore {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamScore {
    pub exam: String,
    pub percentile: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcademicInfo {
    pub current_level: EducationLevel,
    pub stream: Option<Stream>,
    pub board: Option<String>,
    pub percentage: f32,
    #[serde(default)]
    pub subjects: Vec<SubjectScore>,
    #[serde(default)]
    pub entrance_exams: Vec<ExamScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocioeconomicInfo {
    /// INR per year.
    pub annual_family_income: u64,
    pub category: SocialCategory,
    #[serde(default)]
    pub first_generation_learner: bool,
    #[serde(default)]
    pub has_disability: bool,
    #[serde(default)]
    pub siblings: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aspirations {
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferred_careers: Vec<String>,
    pub career_goals: Option<String>,
    pub work_style: Option<WorkStyle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyConstraints {
    /// INR per year the family can spend on education.
    pub max_annual_budget: Option<u64>,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default)]
    pub preferred_states: Vec<String>,
    pub max_study_years: Option<u8>,
    #[serde(default)]
    pub needs_scholarship: bool,
}

/// The five sections of the intake form, in the order the SPA presents them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    Personal,
    Academic,
    Socioeconomic,
    Aspirations,
    Constraints,
}

impl FormStep {
    pub const ALL: [FormStep; 5] = [
        FormStep::Personal,
        FormStep::Academic,
        FormStep::Socioeconomic,
        FormStep::Aspirations,
        FormStep::Constraints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormStep::Personal => "personal",
            FormStep::Academic => "academic",
            FormStep::Socioeconomic => "socioeconomic",
            FormStep::Aspirations => "aspirations",
            FormStep::Constraints => "constraints",
        }
    }

    /// Column in `student_profiles` holding this step's JSON.
    pub fn column(&self) -> &'static str {
        match self {
            FormStep::Personal => "personal",
            FormStep::Academic => "academic",
            FormStep::Socioeconomic => "socioeconomic",
            FormStep::Aspirations => "aspirations",
            FormStep::Constraints => "study_constraints",
        }
    }
}

impl fmt::Display for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("Unknown form step '{s}'"))
    }
}

/// A fully submitted student profile, the input to the recommendation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub personal: PersonalInfo,
    pub academic: AcademicInfo,
    pub socioeconomic: SocioeconomicInfo,
    pub aspirations: Aspirations,
    pub constraints: StudyConstraints,
}

/// Share of family income assumed available for education when no budget is given.
const DERIVED_BUDGET_SHARE: f64 = 0.20;

impl StudentProfile {
    /// SHA-256 of the canonical JSON encoding; stable across identical submissions.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    /// Annual education budget in INR, derived from income when not stated.
    pub fn education_budget(&self) -> u64 {
        self.constraints.max_annual_budget.unwrap_or_else(|| {
            (self.socioeconomic.annual_family_income as f64 * DERIVED_BUDGET_SHARE).round() as u64
        })
    }

    /// States where the student can study, or `None` when any state is acceptable.
    pub fn acceptable_states(&self) -> Option<Vec<String>> {
        if !self.constraints.preferred_states.is_empty() {
            Some(self.constraints.preferred_states.clone())
        } else if !self.constraints.willing_to_relocate {
            Some(vec![self.personal.state.clone()])
        } else {
            None
        }
    }
}

#[cfg(test)]
pub fn sample_profile() -> StudentProfile {
    StudentProfile {
        personal: PersonalInfo {
            full_name: "Ananya Iyer".to_string(),
            age: 17,
            gender: Some(Gender::Female),
            state: "Tamil Nadu".to_string(),
            district: Some("Chennai".to_string()),
            area_type: AreaType::Urban,
            preferred_language: Language::En,
        },
        academic: AcademicInfo {
            current_level: EducationLevel::Class12,
            stream: Some(Stream::Science),
            board: Some("CBSE".to_string()),
            percentage: 88.0,
            subjects: vec![
                SubjectScore {
                    name: "Mathematics".to_string(),
                    score: 92.0,
                },
                SubjectScore {
                    name: "Physics".to_string(),
                    score: 85.0,
                },
                SubjectScore {
                    name: "Computer Science".to_string(),
                    score: 95.0,
                },
            ],
            entrance_exams: vec![ExamScore {
                exam: "JEE Main".to_string(),
                percentile: 91.5,
            }],
        },
        socioeconomic: SocioeconomicInfo {
            annual_family_income: 600_000,
            category: SocialCategory::Obc,
            first_generation_learner: false,
            has_disability: false,
            siblings: 1,
        },
        aspirations: Aspirations {
            interests: vec![
                "coding".to_string(),
                "technology".to_string(),
                "problem solving".to_string(),
            ],
            preferred_careers: vec!["software-engineer".to_string()],
            career_goals: Some("Build products that help farmers".to_string()),
            work_style: Some(WorkStyle::Analytical),
        },
        constraints: StudyConstraints {
            max_annual_budget: Some(250_000),
            willing_to_relocate: true,
            preferred_states: vec![],
            max_study_years: Some(5),
            needs_scholarship: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_level_serde_names() {
        assert_eq!(
            serde_json::to_string(&EducationLevel::Class12).unwrap(),
            r#""class_12""#
        );
        let level: EducationLevel = serde_json::from_str(r#""postgraduate""#).unwrap();
        assert_eq!(level, EducationLevel::Postgraduate);
    }

    #[test]
    fn test_education_level_ordering() {
        assert!(EducationLevel::Class10 < EducationLevel::Class12);
        assert!(EducationLevel::Undergraduate < EducationLevel::Postgraduate);
    }

    #[test]
    fn test_form_step_from_str() {
        assert_eq!("academic".parse::<FormStep>().unwrap(), FormStep::Academic);
        assert!("payment".parse::<FormStep>().is_err());
        assert_eq!(FormStep::Constraints.column(), "study_constraints");
    }

    #[test]
    fn test_language_defaults_to_english() {
        let json = r#"{
            "full_name": "Ravi Kumar",
            "age": 16,
            "gender": null,
            "state": "Bihar",
            "district": null,
            "area_type": "rural"
        }"#;
        let info: PersonalInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.preferred_language, Language::En);
        assert_eq!(info.area_type, AreaType::Rural);
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = sample_profile();
        let mut b = sample_profile();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.academic.percentage = 87.5;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_education_budget_derived_from_income() {
        let mut profile = sample_profile();
        assert_eq!(profile.education_budget(), 250_000);

        profile.constraints.max_annual_budget = None;
        assert_eq!(profile.education_budget(), 120_000);
    }

    #[test]
    fn test_acceptable_states() {
        let mut profile = sample_profile();
        assert_eq!(profile.acceptable_states(), None);

        profile.constraints.willing_to_relocate = false;
        assert_eq!(
            profile.acceptable_states(),
            Some(vec!["Tamil Nadu".to_string()])
        );

        profile.constraints.preferred_states = vec!["Karnataka".to_string()];
        assert_eq!(
            profile.acceptable_states(),
            Some(vec!["Karnataka".to_string()])
        );
    }
}

use serde::{Deserialize, Serialize};

use crate::profile::models::{EducationLevel, Gender, SocialCategory, Stream};

/// Annual salary bands in INR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalaryRange {
    pub entry: u64,
    pub mid: u64,
    pub senior: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrowthOutlook {
    High,
    Moderate,
    Steady,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Career {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    /// Streams that can enter this career. Empty means any stream.
    #[serde(default)]
    pub required_streams: Vec<Stream>,
    pub interest_tags: Vec<String>,
    #[serde(default)]
    pub key_subjects: Vec<String>,
    pub min_percentage: f32,
    pub education_path: Vec<String>,
    pub duration_years: u8,
    #[serde(default)]
    pub entrance_exams: Vec<String>,
    pub salary: SalaryRange,
    pub growth_outlook: GrowthOutlook,
    /// INR per year of study.
    pub annual_education_cost: u64,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Career {
    pub fn accepts_stream(&self, stream: Option<Stream>) -> bool {
        if self.required_streams.is_empty() {
            return true;
        }
        stream.is_some_and(|s| self.required_streams.contains(&s))
    }

    /// Saturates rather than overflowing on untrusted catalog values.
    pub fn total_education_cost(&self) -> u64 {
        self.annual_education_cost
            .saturating_mul(u64::from(self.duration_years))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct College {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub ownership: Ownership,
    /// Career ids this college prepares students for.
    pub careers: Vec<String>,
    pub annual_fees: u64,
    pub min_percentage: f32,
    #[serde(default)]
    pub accepted_exams: Vec<String>,
    pub rating: f32,
    #[serde(default)]
    pub hostel: bool,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scholarship {
    pub id: String,
    pub name: String,
    pub provider: String,
    /// INR per year.
    pub annual_amount: u64,
    #[serde(default)]
    pub eligible_categories: Vec<SocialCategory>,
    pub max_family_income: Option<u64>,
    #[serde(default)]
    pub min_percentage: f32,
    #[serde(default)]
    pub eligible_levels: Vec<EducationLevel>,
    #[serde(default)]
    pub eligible_states: Vec<String>,
    #[serde(default)]
    pub career_categories: Vec<String>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub first_generation_only: bool,
    pub deadline: Option<String>,
    pub url: Option<String>,
}

/// Career listing entry, without the long-form fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub growth_outlook: GrowthOutlook,
    pub entry_salary: u64,
}

impl From<&Career> for CareerSummary {
    fn from(career: &Career) -> Self {
        Self {
            id: career.id.clone(),
            title: career.title.clone(),
            category: career.category.clone(),
            description: career.description.clone(),
            growth_outlook: career.growth_outlook,
            entry_salary: career.salary.entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::test_catalog;

    fn software_engineer() -> Career {
        test_catalog().career("software-engineer").unwrap().clone()
    }

    #[test]
    fn test_total_education_cost() {
        let mut career = software_engineer();
        career.annual_education_cost = 250_000;
        career.duration_years = 4;
        assert_eq!(career.total_education_cost(), 1_000_000);
    }

    #[test]
    fn test_total_education_cost_saturates() {
        let mut career = software_engineer();
        career.annual_education_cost = u64::MAX / 2;
        career.duration_years = 5;
        assert_eq!(career.total_education_cost(), u64::MAX);
    }

    #[test]
    fn test_accepts_stream() {
        let career = software_engineer();
        assert!(career.accepts_stream(Some(Stream::Science)));
        assert!(!career.accepts_stream(None));
    }
}

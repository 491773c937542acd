//! Chart-ready datasets for a student's latest recommendation run.
//!
//! Everything here is a pure function of a `RecommendationSet`, so the SPA can
//! render it without any further aggregation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::recommendation::models::RecommendationSet;
use crate::recommendation::scoring::{
    ACADEMIC_MAX, ASPIRATION_MAX, FEASIBILITY_MAX, INTEREST_MAX, SUBJECTS_MAX,
};

pub const COMPONENT_AXES: [&str; 5] = ["Interest", "Academic", "Subjects", "Aspiration", "Feasibility"];
pub const SALARY_STAGES: [&str; 3] = ["Entry", "Mid-career", "Senior"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub values: Vec<u32>,
}

/// Component scores as a percentage of each component's maximum.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RadarSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalarySeries {
    pub label: String,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardTotals {
    pub careers_recommended: usize,
    pub average_match_score: f64,
    pub colleges_matched: usize,
    pub scholarships_matched: usize,
    /// Sum of annual amounts across distinct matched scholarships, INR.
    pub total_scholarship_value: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dashboard {
    pub summary: String,
    pub ai_enhanced: bool,
    pub match_scores: BarChart,
    pub component_axes: Vec<&'static str>,
    pub score_components: Vec<RadarSeries>,
    pub salary_stages: Vec<&'static str>,
    pub salary_progression: Vec<SalarySeries>,
    pub category_distribution: Vec<CategoryCount>,
    pub totals: DashboardTotals,
}

fn percent_of(value: f64, max: f64) -> f64 {
    ((value / max) * 1000.0).round() / 10.0
}

pub fn build_dashboard(set: &RecommendationSet) -> Dashboard {
    let recs = &set.recommendations;

    let match_scores = BarChart {
        labels: recs.iter().map(|r| r.title.clone()).collect(),
        values: recs.iter().map(|r| r.match_score).collect(),
    };

    let score_components = recs
        .iter()
        .map(|r| {
            let b = &r.breakdown;
            RadarSeries {
                label: r.title.clone(),
                values: vec![
                    percent_of(b.interest, INTEREST_MAX),
                    percent_of(b.academic, ACADEMIC_MAX),
                    percent_of(b.subjects, SUBJECTS_MAX),
                    percent_of(b.aspiration, ASPIRATION_MAX),
                    percent_of(b.feasibility, FEASIBILITY_MAX),
                ],
            }
        })
        .collect();

    let salary_progression = recs
        .iter()
        .map(|r| SalarySeries {
            label: r.title.clone(),
            values: vec![r.salary.entry, r.salary.mid, r.salary.senior],
        })
        .collect();

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in recs {
        *by_category.entry(rec.category.as_str()).or_default() += 1;
    }
    let mut category_distribution: Vec<CategoryCount> = by_category
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the alphabetical order among equal counts.
    category_distribution.sort_by(|a, b| b.count.cmp(&a.count));

    let colleges: HashSet<&str> = recs
        .iter()
        .flat_map(|r| r.colleges.iter())
        .map(|c| c.id.as_str())
        .collect();
    let scholarships: HashMap<&str, u64> = recs
        .iter()
        .flat_map(|r| r.scholarships.iter())
        .map(|s| (s.id.as_str(), s.annual_amount))
        .collect();

    let average_match_score = if recs.is_empty() {
        0.0
    } else {
        let total: u32 = recs.iter().map(|r| r.match_score).sum();
        (f64::from(total) / recs.len() as f64 * 10.0).round() / 10.0
    };

    Dashboard {
        summary: set.summary.clone(),
        ai_enhanced: set.ai_enhanced,
        match_scores,
        component_axes: COMPONENT_AXES.to_vec(),
        score_components,
        salary_stages: SALARY_STAGES.to_vec(),
        salary_progression,
        category_distribution,
        totals: DashboardTotals {
            careers_recommended: recs.len(),
            average_match_score,
            colleges_matched: colleges.len(),
            scholarships_matched: scholarships.len(),
            total_scholarship_value: scholarships.values().sum(),
        },
    }
}

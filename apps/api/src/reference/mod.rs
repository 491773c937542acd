//! Reference data: the career, college, and scholarship catalogs.
//!
//! The catalogs ship compiled into the binary. `REFERENCE_DATA_DIR` points at a
//! directory holding replacement `careers.json`, `colleges.json`, and
//! `scholarships.json`. Either way the data is validated once at startup and is
//! read-only afterwards.

pub mod handlers;
pub mod models;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::reference::models::{Career, College, Scholarship};

const EMBEDDED_CAREERS: &str = include_str!("../../data/careers.json");
const EMBEDDED_COLLEGES: &str = include_str!("../../data/colleges.json");
const EMBEDDED_SCHOLARSHIPS: &str = include_str!("../../data/scholarships.json");

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {catalog} catalog: {source}")]
    Parse {
        catalog: &'static str,
        source: serde_json::Error,
    },

    #[error("Career catalog is empty")]
    NoCareers,

    #[error("Duplicate id '{id}' in {catalog} catalog")]
    DuplicateId { catalog: &'static str, id: String },

    #[error("College '{college}' references unknown career '{career}'")]
    UnknownCareer { college: String, career: String },

    #[error("Career '{0}' salary bands must satisfy entry <= mid <= senior")]
    SalaryOrder(String),

    #[error("{catalog} '{id}' has percentage {value} outside 0..=100")]
    Percentage {
        catalog: &'static str,
        id: String,
        value: f32,
    },

    #[error("College '{id}' has rating {value} outside 0..=5")]
    Rating { id: String, value: f32 },
}

#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    careers: Vec<Career>,
    colleges: Vec<College>,
    scholarships: Vec<Scholarship>,
    career_index: HashMap<String, usize>,
}

fn parse_catalog<T: DeserializeOwned>(
    catalog: &'static str,
    raw: &str,
) -> Result<Vec<T>, ReferenceDataError> {
    serde_json::from_str(raw).map_err(|source| ReferenceDataError::Parse { catalog, source })
}

fn read_catalog_file(dir: &Path, file: &str) -> Result<String, ReferenceDataError> {
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|source| ReferenceDataError::Io { path, source })
}

fn check_unique<'a>(
    catalog: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ReferenceDataError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ReferenceDataError::DuplicateId {
                catalog,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn check_percentage(catalog: &'static str, id: &str, value: f32) -> Result<(), ReferenceDataError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReferenceDataError::Percentage {
            catalog,
            id: id.to_string(),
            value,
        })
    }
}

impl ReferenceCatalog {
    /// Builds a validated catalog.
    pub fn new(
        careers: Vec<Career>,
        colleges: Vec<College>,
        scholarships: Vec<Scholarship>,
    ) -> Result<Self, ReferenceDataError> {
        if careers.is_empty() {
            return Err(ReferenceDataError::NoCareers);
        }
        check_unique("career", careers.iter().map(|c| c.id.as_str()))?;
        check_unique("college", colleges.iter().map(|c| c.id.as_str()))?;
        check_unique("scholarship", scholarships.iter().map(|s| s.id.as_str()))?;

        for career in &careers {
            let s = career.salary;
            if s.entry > s.mid || s.mid > s.senior {
                return Err(ReferenceDataError::SalaryOrder(career.id.clone()));
            }
            check_percentage("career", &career.id, career.min_percentage)?;
        }

        let career_index: HashMap<String, usize> = careers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        for college in &colleges {
            if let Some(unknown) = college.careers.iter().find(|id| !career_index.contains_key(*id)) {
                return Err(ReferenceDataError::UnknownCareer {
                    college: college.id.clone(),
                    career: unknown.clone(),
                });
            }
            check_percentage("college", &college.id, college.min_percentage)?;
            if !(0.0..=5.0).contains(&college.rating) {
                return Err(ReferenceDataError::Rating {
                    id: college.id.clone(),
                    value: college.rating,
                });
            }
        }

        for scholarship in &scholarships {
            check_percentage("scholarship", &scholarship.id, scholarship.min_percentage)?;
        }

        Ok(Self {
            careers,
            colleges,
            scholarships,
            career_index,
        })
    }

    /// The catalogs compiled into the binary.
    pub fn embedded() -> Result<Self, ReferenceDataError> {
        Self::new(
            parse_catalog("career", EMBEDDED_CAREERS)?,
            parse_catalog("college", EMBEDDED_COLLEGES)?,
            parse_catalog("scholarship", EMBEDDED_SCHOLARSHIPS)?,
        )
    }

    pub fn from_dir(dir: &Path) -> Result<Self, ReferenceDataError> {
        Self::new(
            parse_catalog("career", &read_catalog_file(dir, "careers.json")?)?,
            parse_catalog("college", &read_catalog_file(dir, "colleges.json")?)?,
            parse_catalog("scholarship", &read_catalog_file(dir, "scholarships.json")?)?,
        )
    }

    /// Loads from `dir` when given, otherwise the embedded catalogs.
    pub fn load(dir: Option<&Path>) -> Result<Self, ReferenceDataError> {
        let catalog = match dir {
            Some(dir) => {
                info!("Loading reference data from {}", dir.display());
                Self::from_dir(dir)?
            }
            None => Self::embedded()?,
        };
        info!(
            "Reference data loaded: {} careers, {} colleges, {} scholarships",
            catalog.careers.len(),
            catalog.colleges.len(),
            catalog.scholarships.len()
        );
        Ok(catalog)
    }

    pub fn careers(&self) -> &[Career] {
        &self.careers
    }

    pub fn scholarships(&self) -> &[Scholarship] {
        &self.scholarships
    }

    pub fn career(&self, id: &str) -> Option<&Career> {
        self.career_index.get(id).map(|&i| &self.careers[i])
    }

    /// Case-insensitive category filter.
    pub fn careers_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Career> {
        self.careers
            .iter()
            .filter(move |c| c.category.eq_ignore_ascii_case(category))
    }

    pub fn colleges_for_career<'a>(&'a self, career_id: &'a str) -> impl Iterator<Item = &'a College> {
        self.colleges
            .iter()
            .filter(move |c| c.careers.iter().any(|id| id == career_id))
    }

    /// Sorted, de-duplicated interest tags across all careers.
    pub fn interest_vocabulary(&self) -> Vec<String> {
        self.careers
            .iter()
            .flat_map(|c| c.interest_tags.iter())
            .map(|tag| tag.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
pub fn test_catalog() -> ReferenceCatalog {
    ReferenceCatalog::embedded().unwrap()
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::reference::models::{Career, CareerSummary, College};
use crate::reference::ReferenceCatalog;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CareerListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CareerDetail {
    #[serde(flatten)]
    pub career: Career,
    pub colleges: Vec<College>,
}

pub fn list_careers(catalog: &ReferenceCatalog, category: Option<&str>) -> Vec<CareerSummary> {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => catalog
            .careers_in_category(category)
            .map(CareerSummary::from)
            .collect(),
        None => catalog.careers().iter().map(CareerSummary::from).collect(),
    }
}

/// GET /api/v1/reference/careers
pub async fn handle_list_careers(
    State(state): State<AppState>,
    Query(query): Query<CareerListQuery>,
) -> Json<Vec<CareerSummary>> {
    Json(list_careers(&state.catalog, query.category.as_deref()))
}

/// GET /api/v1/reference/careers/:id
pub async fn handle_get_career(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CareerDetail>, AppError> {
    let career = state
        .catalog
        .career(&id)
        .ok_or_else(|| AppError::NotFound(format!("Career '{id}' not found")))?;
    Ok(Json(CareerDetail {
        career: career.clone(),
        colleges: state.catalog.colleges_for_career(&id).cloned().collect(),
    }))
}

/// GET /api/v1/reference/interests
pub async fn handle_list_interests(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.interest_vocabulary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::test_catalog;

    #[test]
    fn test_list_careers_filters_by_category() {
        let catalog = test_catalog();
        let all = list_careers(&catalog, None);
        assert_eq!(all.len(), catalog.careers().len());

        let engineering = list_careers(&catalog, Some(" engineering "));
        assert!(!engineering.is_empty());
        assert!(engineering.len() < all.len());
        assert!(engineering.iter().all(|c| c.category == "engineering"));

        assert_eq!(list_careers(&catalog, Some("")).len(), all.len());
        assert!(list_careers(&catalog, Some("astrology")).is_empty());
    }
}

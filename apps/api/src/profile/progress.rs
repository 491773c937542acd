use serde::{Deserialize, Serialize};

use crate::models::profile::ProfileRow;
use crate::profile::models::FormStep;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileProgress {
    pub completed_steps: Vec<FormStep>,
    pub missing_steps: Vec<FormStep>,
    /// First incomplete step in form order; `None` once every step is saved.
    pub next_step: Option<FormStep>,
    pub progress_percent: u8,
    pub status: String,
}

pub fn step_is_saved(row: &ProfileRow, step: FormStep) -> bool {
    let value = match step {
        FormStep::Personal => &row.personal,
        FormStep::Academic => &row.academic,
        FormStep::Socioeconomic => &row.socioeconomic,
        FormStep::Aspirations => &row.aspirations,
        FormStep::Constraints => &row.study_constraints,
    };
    value.as_ref().is_some_and(|v| !v.is_null())
}

pub fn compute_progress(row: &ProfileRow) -> ProfileProgress {
    let (completed_steps, missing_steps): (Vec<FormStep>, Vec<FormStep>) = FormStep::ALL
        .into_iter()
        .partition(|step| step_is_saved(row, *step));

    let progress_percent =
        ((completed_steps.len() as f64 / FormStep::ALL.len() as f64) * 100.0).round() as u8;

    ProfileProgress {
        next_step: missing_steps.first().copied(),
        completed_steps,
        missing_steps,
        progress_percent,
        status: row.status.clone(),
    }
}

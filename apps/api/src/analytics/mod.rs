//! Dashboards: per-student chart data and the staff overview.

pub mod dashboard;
pub mod handlers;
pub mod overview;

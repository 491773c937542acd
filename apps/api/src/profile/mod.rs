//! The multi-step student profile form.

pub mod handlers;
pub mod models;
pub mod progress;
pub mod steps;
pub mod store;

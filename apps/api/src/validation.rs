//! Input sanitisation and field-level validation shared by the auth and profile forms.
//!
//! Everything coming from the SPA goes through `sanitize_text` before it is stored or
//! echoed into an LLM prompt. Validation failures are collected per field so the
//! multi-step form can highlight every problem in one round-trip.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{AppError, FieldError};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid html tag regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

const MAX_EMAIL_LEN: usize = 254;

/// Strips markup and control characters, collapses whitespace, and truncates to
/// `max_chars` characters.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    let without_tags = HTML_TAG.replace_all(input, " ");
    let without_controls: String = without_tags
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| !matches!(c, '<' | '>'))
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(&without_controls, " ");
    collapsed.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Sanitises every item, drops empties, and de-duplicates case-insensitively
/// keeping the first spelling seen.
pub fn sanitize_list(items: &[String], max_items: usize, max_chars: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| sanitize_text(item, max_chars))
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .take(max_items)
        .collect()
}

pub fn sanitize_optional(input: Option<&str>, max_chars: usize) -> Option<String> {
    input
        .map(|s| sanitize_text(s, max_chars))
        .filter(|s| !s.is_empty())
}

/// Trims and lowercases an email address.
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL.is_match(email)
}

/// Accumulates field errors across a whole form section.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.push(field, format!("must be between {min} and {max} characters"));
        }
    }

    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T)
    where
        T: PartialOrd + Display + Copy,
    {
        // NaN fails both comparisons, so check containment rather than exclusion.
        if !(value >= min && value <= max) {
            self.push(field, format!("must be between {min} and {max}"));
        }
    }

    pub fn max_items<T>(&mut self, field: &str, items: &[T], max: usize) {
        if items.len() > max {
            self.push(field, format!("must contain at most {max} items"));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

//! Career recommendations: scoring, matching, engines, persistence, and reports.

pub mod engine;
pub mod generator;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod scoring;
pub mod store;

/// Formats rupees with Indian digit grouping: 1234567 -> "12,34,567".
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

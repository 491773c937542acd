//! Cohort-level statistics for counselors and admins.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;

pub const HISTOGRAM_BUCKET_WIDTH: i32 = 20;
const HISTOGRAM_BUCKETS: usize = 5;
const TOP_CAREERS_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramBucket {
    pub range: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CareerPopularity {
    pub career_id: String,
    pub career_title: String,
    pub times_recommended: i64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CareerFeedback {
    pub career_id: String,
    pub average_rating: f64,
    pub responses: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewTotals {
    pub students: i64,
    pub submitted_profiles: i64,
    pub recommendation_runs: i64,
    pub ai_enhanced_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub totals: OverviewTotals,
    pub average_match_score: Option<f64>,
    pub score_histogram: Vec<HistogramBucket>,
    pub top_careers: Vec<CareerPopularity>,
    pub profiles_by_state: Vec<LabelCount>,
    pub profiles_by_area_type: Vec<LabelCount>,
    pub feedback_by_career: Vec<CareerFeedback>,
}

/// Buckets of 20 over 0..=100; the last bucket also holds 100.
pub fn score_histogram(score_counts: &[(i32, i64)]) -> Vec<HistogramBucket> {
    let mut counts = [0i64; HISTOGRAM_BUCKETS];
    for &(score, count) in score_counts {
        let bucket = (score.clamp(0, 100) / HISTOGRAM_BUCKET_WIDTH) as usize;
        counts[bucket.min(HISTOGRAM_BUCKETS - 1)] += count;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let low = i as i32 * HISTOGRAM_BUCKET_WIDTH;
            let high = if i == HISTOGRAM_BUCKETS - 1 {
                100
            } else {
                low + HISTOGRAM_BUCKET_WIDTH - 1
            };
            HistogramBucket {
                range: format!("{low}-{high}"),
                count,
            }
        })
        .collect()
}

pub fn share(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 1000.0).round() / 1000.0
    }
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
}

pub async fn fetch_overview(pool: &PgPool) -> Result<Overview, AppError> {
    let students = count(pool, "SELECT COUNT(*) FROM users WHERE role = 'student'").await?;
    let submitted_profiles = count(
        pool,
        "SELECT COUNT(*) FROM student_profiles WHERE status = 'submitted'",
    )
    .await?;
    let recommendation_runs = count(pool, "SELECT COUNT(*) FROM recommendation_runs").await?;
    let ai_runs = count(
        pool,
        "SELECT COUNT(*) FROM recommendation_runs WHERE ai_enhanced",
    )
    .await?;

    let average_match_score: Option<f64> =
        sqlx::query_scalar("SELECT AVG(match_score)::FLOAT8 FROM recommendation_items")
            .fetch_one(pool)
            .await?;

    let score_counts: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT match_score, COUNT(*) FROM recommendation_items GROUP BY match_score",
    )
    .fetch_all(pool)
    .await?;

    let top_careers = sqlx::query_as::<_, CareerPopularity>(
        r#"
        SELECT career_id,
               MAX(career_title) AS career_title,
               COUNT(*) AS times_recommended,
               AVG(match_score)::FLOAT8 AS average_score
        FROM recommendation_items
        GROUP BY career_id
        ORDER BY times_recommended DESC, career_id
        LIMIT $1
        "#,
    )
    .bind(TOP_CAREERS_LIMIT)
    .fetch_all(pool)
    .await?;

    let profiles_by_state = sqlx::query_as::<_, LabelCount>(
        r#"
        SELECT COALESCE(personal->>'state', 'unknown') AS label, COUNT(*) AS count
        FROM student_profiles
        GROUP BY 1
        ORDER BY count DESC, label
        "#,
    )
    .fetch_all(pool)
    .await?;

    let profiles_by_area_type = sqlx::query_as::<_, LabelCount>(
        r#"
        SELECT COALESCE(personal->>'area_type', 'unknown') AS label, COUNT(*) AS count
        FROM student_profiles
        GROUP BY 1
        ORDER BY count DESC, label
        "#,
    )
    .fetch_all(pool)
    .await?;

    let feedback_by_career = sqlx::query_as::<_, CareerFeedback>(
        r#"
        SELECT career_id,
               AVG(rating)::FLOAT8 AS average_rating,
               COUNT(*) AS responses
        FROM recommendation_feedback
        GROUP BY career_id
        ORDER BY career_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(Overview {
        totals: OverviewTotals {
            students,
            submitted_profiles,
            recommendation_runs,
            ai_enhanced_share: share(ai_runs, recommendation_runs),
        },
        average_match_score,
        score_histogram: score_histogram(&score_counts),
        top_careers,
        profiles_by_state,
        profiles_by_area_type,
        feedback_by_career,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bucket_edges() {
        let buckets = score_histogram(&[(0, 1), (19, 2), (20, 3), (79, 4), (80, 5), (100, 6)]);
        let ranges: Vec<_> = buckets.iter().map(|b| b.range.as_str()).collect();
        assert_eq!(ranges, vec!["0-19", "20-39", "40-59", "60-79", "80-100"]);
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 3, 0, 4, 11]);
    }

    #[test]
    fn test_histogram_empty() {
        let buckets = score_histogram(&[]);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_share() {
        assert_eq!(share(0, 0), 0.0);
        assert_eq!(share(1, 3), 0.333);
        assert_eq!(share(5, 5), 1.0);
    }
}

//! Markdown career report for a recommendation run, stored in S3.

use std::fmt::{self, Write};

use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::recommendation::RecommendationRunRow;
use crate::recommendation::format_inr;
use crate::recommendation::models::{Recommendation, RecommendationSet};

pub fn report_key(user_id: Uuid, run_id: Uuid) -> String {
    format!("reports/{user_id}/{run_id}.md")
}

pub fn render_markdown(
    run: &RecommendationRunRow,
    set: &RecommendationSet,
    student_name: &str,
) -> Result<String, fmt::Error> {
    let mut md = String::new();
    writeln!(md, "# Career Recommendations for {student_name}\n")?;
    writeln!(
        md,
        "_Generated {} · engine: {}{}_\n",
        set.generated_at.format("%d %b %Y"),
        set.engine,
        if set.ai_enhanced { " (AI-reviewed)" } else { "" }
    )?;
    writeln!(md, "{}\n", set.summary)?;

    if set.recommendations.is_empty() {
        writeln!(
            md,
            "No careers were recommended for this profile. A counselor can help you explore options."
        )?;
    }

    for rec in &set.recommendations {
        render_recommendation(&mut md, rec)?;
    }

    writeln!(md, "---\nRun `{}`", run.id)?;
    Ok(md)
}

fn render_recommendation(md: &mut String, rec: &Recommendation) -> fmt::Result {
    writeln!(
        md,
        "## {}. {} ({}/100, {})\n",
        rec.rank,
        rec.title,
        rec.match_score,
        rec.match_level.as_str()
    )?;
    writeln!(md, "{}\n", rec.description)?;

    if let Some(rationale) = &rec.ai_rationale {
        writeln!(md, "> {rationale}\n")?;
    }

    if !rec.reasons.is_empty() {
        writeln!(md, "**Why this fits**\n")?;
        for reason in &rec.reasons {
            writeln!(md, "- {reason}")?;
        }
        md.push('\n');
    }

    writeln!(md, "**Education path** ({} years)\n", rec.duration_years)?;
    for (i, step) in rec.education_path.iter().enumerate() {
        writeln!(md, "{}. {step}", i + 1)?;
    }
    md.push('\n');

    if !rec.entrance_exams.is_empty() {
        writeln!(md, "**Entrance exams:** {}\n", rec.entrance_exams.join(", "))?;
    }

    writeln!(
        md,
        "**Salary (per year):** entry ₹{} · mid-career ₹{} · senior ₹{}\n",
        format_inr(rec.salary.entry),
        format_inr(rec.salary.mid),
        format_inr(rec.salary.senior)
    )?;
    writeln!(
        md,
        "**Estimated education cost:** ₹{}\n",
        format_inr(rec.estimated_total_cost)
    )?;

    if !rec.colleges.is_empty() {
        writeln!(md, "| College | Location | Annual fees | Rating |")?;
        writeln!(md, "|---|---|---|---|")?;
        for college in &rec.colleges {
            writeln!(
                md,
                "| {} | {}, {} | ₹{}{} | {:.1} |",
                college.name,
                college.city,
                college.state,
                format_inr(college.annual_fees),
                if college.affordable { "" } else { " (over budget)" },
                college.rating
            )?;
        }
        md.push('\n');
    }

    if !rec.scholarships.is_empty() {
        writeln!(md, "**Scholarships**\n")?;
        for s in &rec.scholarships {
            let deadline = s
                .deadline
                .as_deref()
                .map(|d| format!(", deadline {d}"))
                .unwrap_or_default();
            writeln!(
                md,
                "- {} ({}): ₹{} a year{deadline}",
                s.name,
                s.provider,
                format_inr(s.annual_amount)
            )?;
        }
        md.push('\n');
    }

    if !rec.next_steps.is_empty() {
        writeln!(md, "**Next steps**\n")?;
        for step in &rec.next_steps {
            writeln!(md, "- [ ] {step}")?;
        }
        md.push('\n');
    }
    Ok(())
}

pub async fn upload_report(
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    key: &str,
    markdown: String,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(s3_bucket)
        .key(key)
        .body(ByteStream::from(markdown.into_bytes()))
        .content_type("text/markdown; charset=utf-8")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Report upload failed: {e}")))?;

    info!("Uploaded career report to s3://{}/{}", s3_bucket, key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::sample_profile;
    use crate::recommendation::pipeline::rule_based_set;
    use crate::reference::test_catalog;
    use chrono::Utc;

    fn run_for(set: &RecommendationSet) -> RecommendationRunRow {
        RecommendationRunRow {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            profile_id: Uuid::nil(),
            engine: set.engine.clone(),
            ai_enhanced: set.ai_enhanced,
            cached: false,
            profile_fingerprint: "f".repeat(64),
            summary: set.summary.clone(),
            result: serde_json::to_value(set).unwrap(),
            report_key: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_key_layout() {
        let user = Uuid::nil();
        let run = Uuid::from_u128(1);
        assert_eq!(
            report_key(user, run),
            "reports/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000001.md"
        );
    }

    #[test]
    fn test_markdown_contains_each_recommendation() {
        let set = rule_based_set("rule_based", &sample_profile(), &test_catalog(), 2);
        let md = render_markdown(&run_for(&set), &set, "Ananya Iyer").unwrap();

        assert!(md.starts_with("# Career Recommendations for Ananya Iyer"));
        assert!(md.contains("## 1. Software Engineer (85/100, excellent)"));
        assert!(md.contains("## 2. "));
        assert!(md.contains("| Indian Institute of Technology Madras | Chennai, Tamil Nadu | ₹2,20,000 | 4.9 |"));
        assert!(md.contains("- [ ] Prepare for JEE Main"));
        assert!(md.contains("entry ₹6,00,000"));
    }

    #[test]
    fn test_markdown_for_empty_set() {
        let mut set = rule_based_set("rule_based", &sample_profile(), &test_catalog(), 2);
        set.recommendations.clear();
        let md = render_markdown(&run_for(&set), &set, "Ananya Iyer").unwrap();
        assert!(md.contains("No careers were recommended"));
    }
}

use mongodb::bson::doc;
use serde::Serialize;

use crate::database::MongoDB;
use crate::models::file::File;
use crate::models::insight::{AIInsight, FileAnalysis, FoodSuggestions};
use crate::utils::error::AppError;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// Normalized insight view for a report: findings carry a derived severity
/// so clients can color-code without re-parsing prose.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightView {
    pub summary: String,
    pub key_findings: Vec<RatedFinding>,
    pub abnormal_values: Vec<String>,
    pub doctor_questions: Vec<String>,
    pub food_suggestions: FoodSuggestions,
    pub home_remedies: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RatedFinding {
    pub id: usize,
    pub description: String,
    pub severity: Severity,
}

/// Fetches a report's metadata, scoped to the owner. A record owned by
/// someone else is indistinguishable from a missing one.
pub async fn get_report(db: &MongoDB, user_id: &str, report_id: &str) -> Result<File, AppError> {
    db.collection::<File>("files")
        .find_one(doc! { "_id": report_id, "userId": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))
}

/// Fetches the insight tied to a report and derives per-finding severity.
pub async fn get_insight_view(
    db: &MongoDB,
    user_id: &str,
    report_id: &str,
) -> Result<InsightView, AppError> {
    let insight = db
        .collection::<AIInsight>("ai_insights")
        .find_one(doc! { "fileId": report_id, "userId": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("No insights found for this report".to_string()))?;

    Ok(build_view(insight.file_analysis))
}

fn build_view(analysis: FileAnalysis) -> InsightView {
    let severity = overall_severity(&analysis);
    let key_findings = analysis
        .key_findings
        .into_iter()
        .enumerate()
        .map(|(id, description)| RatedFinding {
            id,
            severity: finding_severity(&description),
            description,
        })
        .collect();

    InsightView {
        summary: analysis.summary,
        key_findings,
        abnormal_values: analysis.abnormal_values,
        doctor_questions: analysis.doctor_questions,
        food_suggestions: analysis.food_suggestions,
        home_remedies: analysis.home_remedies,
        severity,
    }
}

/// Keyword heuristic over one finding.
pub fn finding_severity(finding: &str) -> Severity {
    let lower = finding.to_lowercase();
    if lower.contains("critical") || lower.contains("severe") || lower.contains("emergency") {
        Severity::High
    } else if lower.contains("elevated") || lower.contains("abnormal") || lower.contains("concern") {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Keyword heuristic across all findings; `Info` when nothing matches.
pub fn overall_severity(analysis: &FileAnalysis) -> Severity {
    if analysis.key_findings.is_empty() {
        return Severity::Info;
    }
    let combined = analysis.key_findings.join(" ").to_lowercase();
    if combined.contains("critical") || combined.contains("severe") {
        Severity::High
    } else if combined.contains("abnormal") || combined.contains("elevated") {
        Severity::Medium
    } else if combined.contains("normal") || combined.contains("within range") {
        Severity::Low
    } else {
        Severity::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis_with(findings: Vec<&str>) -> FileAnalysis {
        FileAnalysis {
            abnormal_values: vec![],
            key_findings: findings.into_iter().map(String::from).collect(),
            summary: "s".to_string(),
            urdu_summary: String::new(),
            doctor_questions: vec![],
            food_suggestions: FoodSuggestions {
                avoid: vec![],
                recommended: vec![],
            },
            home_remedies: vec![],
            friendly_note: "n".to_string(),
        }
    }

    #[test]
    fn test_finding_severity_keywords() {
        assert_eq!(finding_severity("Critical platelet drop"), Severity::High);
        assert_eq!(finding_severity("SEVERE dehydration"), Severity::High);
        assert_eq!(finding_severity("Elevated cholesterol"), Severity::Medium);
        assert_eq!(finding_severity("Abnormal liver enzymes"), Severity::Medium);
        assert_eq!(finding_severity("Everything looks good"), Severity::Low);
    }

    #[test]
    fn test_overall_severity_prefers_worst() {
        assert_eq!(
            overall_severity(&analysis_with(vec!["normal sugar", "severe anemia"])),
            Severity::High
        );
        assert_eq!(
            overall_severity(&analysis_with(vec!["elevated BP"])),
            Severity::Medium
        );
        assert_eq!(
            overall_severity(&analysis_with(vec!["all within range"])),
            Severity::Low
        );
        assert_eq!(
            overall_severity(&analysis_with(vec!["follow up in 3 months"])),
            Severity::Info
        );
        assert_eq!(overall_severity(&analysis_with(vec![])), Severity::Info);
    }

    #[test]
    fn test_view_numbers_findings() {
        let view = build_view(analysis_with(vec!["normal sugar", "elevated BP"]));
        assert_eq!(view.key_findings.len(), 2);
        assert_eq!(view.key_findings[0].id, 0);
        assert_eq!(view.key_findings[1].id, 1);
        assert_eq!(view.key_findings[1].severity, Severity::Medium);
        assert_eq!(view.severity, Severity::Medium);
    }
}

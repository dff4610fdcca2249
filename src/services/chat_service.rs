use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::database::MongoDB;
use crate::models::chat::{ChatMessage, ChatRequest};
use crate::models::file::File;
use crate::models::insight::AIInsight;
use crate::models::vitals::Vitals;
use crate::services::gemini_service::{self, GenerationConfig, TextGenerator};
use crate::utils::error::AppError;

const HISTORY_WINDOW: usize = 6;

pub struct ChatAnswer {
    pub response: String,
    pub sources: Vec<String>,
    pub confidence: u8,
}

/// Answers a free-text question: retrieved context + truncated history +
/// question go upstream once; the reply is decorated with keyword-derived
/// source tags and a fixed confidence placeholder.
pub async fn answer(
    db: &MongoDB,
    generator: &dyn TextGenerator,
    user_id: &str,
    request: &ChatRequest,
) -> Result<ChatAnswer, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let context_tag = request.context.as_deref();
    let health_context =
        build_health_context(db, user_id, context_tag, request.report_id.as_deref()).await?;

    let history = format_history(&request.conversation_history);
    let prompt = build_prompt(&health_context, &history, &request.message);

    let outcome = generator
        .generate(&prompt, None, Some(GenerationConfig::chat()))
        .await?;

    let sources = extract_sources(&outcome.text, context_tag, request.report_id.as_deref());

    Ok(ChatAnswer {
        response: outcome.text,
        sources,
        confidence: 95,
    })
}

/// Builds the natural-language context paragraph by branching on the context
/// tag. A named report that is missing (or not the caller's) silently falls
/// back to the general context.
async fn build_health_context(
    db: &MongoDB,
    user_id: &str,
    context: Option<&str>,
    report_id: Option<&str>,
) -> Result<String, AppError> {
    match (context, report_id) {
        (Some("report"), Some(report_id)) => {
            let report = db
                .collection::<File>("files")
                .find_one(doc! { "_id": report_id, "userId": user_id })
                .await?;
            match report {
                Some(report) => {
                    let insight = db
                        .collection::<AIInsight>("ai_insights")
                        .find_one(doc! { "fileId": report_id, "userId": user_id })
                        .await?;
                    Ok(format_report_context(&report, insight.as_ref()))
                }
                None => Ok("General health inquiry.".to_string()),
            }
        }
        (Some("dashboard"), _) => {
            let recent_vitals = recent_vitals(db, user_id, 5).await?;
            let report_count = db
                .collection::<File>("files")
                .find(doc! { "userId": user_id })
                .sort(doc! { "uploadDate": -1 })
                .limit(3)
                .await?
                .try_collect::<Vec<File>>()
                .await?
                .len();
            let insight_count = db
                .collection::<AIInsight>("ai_insights")
                .find(doc! { "userId": user_id })
                .sort(doc! { "createdAt": -1 })
                .limit(3)
                .await?
                .try_collect::<Vec<AIInsight>>()
                .await?
                .len();
            Ok(format_dashboard_context(
                &recent_vitals,
                report_count,
                insight_count,
            ))
        }
        (Some("vitals"), _) => {
            let recent = recent_vitals(db, user_id, 10).await?;
            Ok(format_vitals_context(&recent))
        }
        _ => Ok("General health inquiry.".to_string()),
    }
}

async fn recent_vitals(db: &MongoDB, user_id: &str, limit: i64) -> Result<Vec<Vitals>, AppError> {
    let vitals: Vec<Vitals> = db
        .collection::<Vitals>("vitals")
        .find(doc! { "userId": user_id })
        .sort(doc! { "date": -1 })
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(vitals)
}

fn format_report_context(report: &File, insight: Option<&AIInsight>) -> String {
    let mut context = format!(
        "The user is asking about their medical report titled \"{}\". ",
        report.original_name
    );
    if let Some(insight) = insight {
        context.push_str(&format!(
            "AI analysis summary: {}. ",
            insight.file_analysis.summary
        ));
        if !insight.file_analysis.key_findings.is_empty() {
            context.push_str(&format!(
                "Key findings: {}. ",
                insight.file_analysis.key_findings.join(", ")
            ));
        }
    }
    context
}

fn format_dashboard_context(vitals: &[Vitals], report_count: usize, insight_count: usize) -> String {
    let mut context = format!(
        "User's health overview: {} recent vital recordings, {} medical reports, {} AI insights. ",
        vitals.len(),
        report_count,
        insight_count
    );
    if let Some(latest) = vitals.first() {
        if let Some(bp) = &latest.blood_pressure {
            context.push_str(&format!(
                "Latest blood pressure: {}/{} mmHg. ",
                bp.systolic, bp.diastolic
            ));
        }
        if let Some(hr) = latest.heart_rate {
            context.push_str(&format!("Latest heart rate: {} bpm. ", hr));
        }
    }
    context
}

fn format_vitals_context(vitals: &[Vitals]) -> String {
    let mut context = format!(
        "User's vital signs data: {} recordings available. ",
        vitals.len()
    );
    if let Some(latest) = vitals.first() {
        context.push_str("Most recent: ");
        if let Some(bp) = &latest.blood_pressure {
            context.push_str(&format!("BP: {}/{}, ", bp.systolic, bp.diastolic));
        }
        if let Some(hr) = latest.heart_rate {
            context.push_str(&format!("HR: {}bpm, ", hr));
        }
        if let Some(temp) = latest.temperature {
            context.push_str(&format!("Temp: {}°C. ", temp));
        }
    }
    context
}

/// Last 6 turns, rendered one per line as `User:`/`Assistant:`.
fn format_history(history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let rendered = history[start..]
        .iter()
        .map(|msg| {
            let speaker = if msg.role == "user" { "User" } else { "Assistant" };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");
    if rendered.is_empty() {
        "No previous conversation.".to_string()
    } else {
        rendered
    }
}

fn build_prompt(context: &str, history: &str, question: &str) -> String {
    gemini_service::CHAT_PROMPT_TEMPLATE
        .replace("{CONTEXT}", context)
        .replace("{HISTORY}", history)
        .replace("{QUESTION}", question)
}

/// Keyword-derived "sources" for the answer. A presentation nicety, not a
/// grounded citation system.
pub fn extract_sources(
    response: &str,
    context: Option<&str>,
    report_id: Option<&str>,
) -> Vec<String> {
    let mut sources = Vec::new();
    let lower = response.to_lowercase();

    if context == Some("report") && report_id.is_some() {
        sources.push("Medical Report Analysis".to_string());
        sources.push("AI Health Insights".to_string());
    }

    if lower.contains("blood pressure") || response.contains("BP") {
        sources.push("Vital Signs Data".to_string());
    }

    if lower.contains("report") || lower.contains("test") || lower.contains("lab") {
        sources.push("Medical Reports".to_string());
    }

    if lower.contains("diet") || lower.contains("food") || lower.contains("nutrition") {
        sources.push("Nutrition Guidelines".to_string());
    }

    sources.push("Medical Knowledge Base".to_string());
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_history_truncates_to_last_six() {
        let history: Vec<ChatMessage> = (0..10)
            .map(|i| msg(if i % 2 == 0 { "user" } else { "assistant" }, &format!("m{}", i)))
            .collect();
        let rendered = format_history(&history);
        assert!(!rendered.contains("m3"));
        assert!(rendered.contains("m4"));
        assert!(rendered.contains("m9"));
        assert_eq!(rendered.lines().count(), 6);
        assert!(rendered.starts_with("User: m4"));
    }

    #[test]
    fn test_empty_history_placeholder() {
        assert_eq!(format_history(&[]), "No previous conversation.");
    }

    #[test]
    fn test_prompt_substitutes_all_placeholders() {
        let prompt = build_prompt("ctx", "hist", "why am I tired?");
        assert!(prompt.contains("User Context: ctx"));
        assert!(prompt.contains("Conversation History: hist"));
        assert!(prompt.contains("Current Question: why am I tired?"));
        assert!(!prompt.contains("{CONTEXT}"));
        assert!(!prompt.contains("{HISTORY}"));
        assert!(!prompt.contains("{QUESTION}"));
    }

    #[test]
    fn test_extract_sources_keywords() {
        let sources = extract_sources(
            "Your blood pressure looks fine; keep a balanced diet.",
            None,
            None,
        );
        assert!(sources.contains(&"Vital Signs Data".to_string()));
        assert!(sources.contains(&"Nutrition Guidelines".to_string()));
        assert_eq!(sources.last().unwrap(), "Medical Knowledge Base");
    }

    #[test]
    fn test_extract_sources_report_context() {
        let sources = extract_sources("See your lab results.", Some("report"), Some("abc"));
        assert_eq!(sources[0], "Medical Report Analysis");
        assert!(sources.contains(&"AI Health Insights".to_string()));
        assert!(sources.contains(&"Medical Reports".to_string()));
    }

    #[test]
    fn test_extract_sources_always_has_fallback() {
        let sources = extract_sources("Hello!", None, None);
        assert_eq!(sources, vec!["Medical Knowledge Base".to_string()]);
    }

    #[test]
    fn test_dashboard_context_mentions_latest_reading() {
        let vitals = Vitals {
            id: "v1".to_string(),
            user_id: "u1".to_string(),
            date: Utc::now(),
            blood_pressure: Some(crate::models::vitals::BloodPressure {
                systolic: 118,
                diastolic: 76,
            }),
            blood_sugar: None,
            weight: None,
            heart_rate: Some(70),
            temperature: None,
            notes: None,
            created_at: Utc::now(),
        };
        let context = format_dashboard_context(&[vitals], 2, 1);
        assert!(context.contains("1 recent vital recordings"));
        assert!(context.contains("2 medical reports"));
        assert!(context.contains("Latest blood pressure: 118/76 mmHg."));
        assert!(context.contains("Latest heart rate: 70 bpm."));
    }
}

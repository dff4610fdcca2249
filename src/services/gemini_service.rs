use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::insight::FileAnalysis;
use crate::utils::error::AppError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const MAX_ATTEMPTS: u32 = 2;

/// Instruction prompt describing the exact JSON shape the analysis endpoints
/// expect back from the model.
pub const HEALTH_ANALYSIS_PROMPT: &str = r#"
You are HealthMate, a medical AI assistant. Analyze the provided medical content and provide a comprehensive response in the following structured JSON format:

{
  "abnormalValues": ["list of abnormal values with explanations"],
  "keyFindings": ["main findings from the report"],
  "summary": "Detailed summary in English",
  "urduSummary": "Roman Urdu translation of the summary",
  "doctorQuestions": ["3-5 relevant questions to ask doctor"],
  "foodSuggestions": {
    "avoid": ["foods to avoid"],
    "recommended": ["recommended foods"]
  },
  "homeRemedies": ["suggested home remedies"],
  "friendlyNote": "Always consult your doctor before making any decision."
}

Content to analyze:
"#;

/// Directive template for the conversational assistant.
pub const CHAT_PROMPT_TEMPLATE: &str = r#"
You are HealthMate AI, a friendly and knowledgeable medical AI assistant. Your role is to help users understand their health data while being cautious and always recommending professional medical consultation.

IMPORTANT GUIDELINES:
- Be empathetic and supportive
- Never provide medical diagnoses
- Always suggest consulting healthcare professionals
- Explain medical terms in simple language
- Base responses on the provided context when available
- If unsure, admit limitations and suggest professional help

User Context: {CONTEXT}
Conversation History: {HISTORY}

Current Question: {QUESTION}

Please provide a helpful, accurate response that:
1. Answers the question based on available information
2. Explains any medical concepts clearly
3. Includes relevant suggestions when appropriate
4. Ends with a reminder to consult healthcare providers
"#;

/// Binary payload submitted alongside a prompt, already base64-encoded.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: i32,
    pub top_p: f32,
    pub max_output_tokens: i32,
}

impl GenerationConfig {
    /// Settings used by the chat responder.
    pub fn chat() -> Self {
        GenerationConfig {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

// ---------- generateContent wire types ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Result of one upstream call: the concatenated text plus the raw payload,
/// persisted opaquely on the insight.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub text: String,
    pub raw: serde_json::Value,
}

/// Seam over the upstream completion API so services stay testable without
/// network access.
#[async_trait(?Send)]
pub trait TextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<Attachment>,
        config: Option<GenerationConfig>,
    ) -> Result<GenerationOutcome, AppError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new() -> Self {
        let timeout_secs = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        GeminiClient {
            http,
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        )
    }

    async fn call_once(&self, body: &GenerateContentRequest) -> Result<GenerationOutcome, AppError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(e.to_string())
                } else {
                    AppError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Gemini API error: {}",
                status
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Failed to read response: {}", e)))?;

        let parsed: GenerateContentResponse = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::UpstreamUnavailable(format!("Unexpected response shape: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(AppError::UpstreamUnavailable(
                "Empty response from model".to_string(),
            ));
        }

        Ok(GenerationOutcome { text, raw })
    }
}

#[async_trait(?Send)]
impl TextGenerator for GeminiClient {
    /// One logical generation. Transient failures (timeout, 5xx, transport)
    /// get a single bounded retry with linear backoff; 4xx is terminal.
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<Attachment>,
        config: Option<GenerationConfig>,
    ) -> Result<GenerationOutcome, AppError> {
        let mut parts = vec![Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        }];
        if let Some(att) = attachment {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: att.mime_type,
                    data: att.data,
                }),
            });
        }

        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: config,
        };

        let mut last_err = AppError::UpstreamUnavailable("no attempts made".to_string());
        for attempt in 1..=MAX_ATTEMPTS {
            match self.call_once(&body).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    let retryable = matches!(
                        e,
                        AppError::Timeout(_) | AppError::UpstreamUnavailable(_)
                    );
                    log::warn!("⚠️  Gemini attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    last_err = e;
                    if !retryable || attempt == MAX_ATTEMPTS {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
            }
        }
        Err(last_err)
    }
}

/// Removes Markdown code-fence wrapping the model tends to add around JSON.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses model output into the structured analysis. Fence-stripping first,
/// then a shape-validating deserialize: syntactically broken JSON and
/// structurally wrong JSON both classify as `MalformedResponse`.
pub fn parse_analysis(raw: &str) -> Result<FileAnalysis, AppError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<FileAnalysis>(&cleaned).map_err(|e| {
        log::error!("❌ Invalid JSON from Gemini: {}", cleaned);
        AppError::MalformedResponse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_BODY: &str = r#"{
        "abnormalValues": ["WBC 13.2 (high)"],
        "keyFindings": ["Elevated white cell count"],
        "summary": "Possible infection markers.",
        "urduSummary": "Infection ke asaar hain.",
        "doctorQuestions": ["Do I need antibiotics?"],
        "foodSuggestions": {"avoid": ["Sugar"], "recommended": ["Citrus"]},
        "homeRemedies": ["Rest and fluids"],
        "friendlyNote": "Always consult your doctor before making any decision."
    }"#;

    #[test]
    fn test_strip_code_fences() {
        let fenced = format!("```json\n{}\n```", VALID_BODY);
        let stripped = strip_code_fences(&fenced);
        assert!(stripped.starts_with('{'));
        assert!(stripped.ends_with('}'));
        assert!(!stripped.contains("```"));
    }

    #[test]
    fn test_strip_is_noop_without_fences() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_fenced_analysis() {
        let fenced = format!("```json\n{}\n```", VALID_BODY);
        let analysis = parse_analysis(&fenced).unwrap();
        assert_eq!(analysis.key_findings, vec!["Elevated white cell count"]);
        assert_eq!(analysis.food_suggestions.recommended, vec!["Citrus"]);
    }

    #[test]
    fn test_parse_invalid_json_is_malformed() {
        let err = parse_analysis("```json\nnot json at all\n```").unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_wrong_shape_is_malformed() {
        // valid JSON, wrong structure
        let err = parse_analysis(r#"{"verdict": "fine", "score": 10}"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_serializes_camel_case_inline_data() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some("analyze".to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "application/pdf".to_string(),
                            data: "aGVsbG8=".to_string(),
                        }),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig::chat()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "analyze");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        // unused sides of the part union stay off the wire
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn test_candidate_text_extraction() {
        let raw = serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, "Hello world");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::file::File;

fn default_friendly_note() -> String {
    "Always consult your doctor before making any decision.".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodSuggestions {
    pub avoid: Vec<String>,
    pub recommended: Vec<String>,
}

/// Structured analysis produced by the upstream model.
///
/// Deserializing model output into this struct IS the shape validation:
/// missing or mistyped required fields fail the parse. `urduSummary` and
/// `friendlyNote` tolerate omission since the model drops them occasionally.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub abnormal_values: Vec<String>,
    pub key_findings: Vec<String>,
    pub summary: String,
    #[serde(default)]
    pub urdu_summary: String,
    pub doctor_questions: Vec<String>,
    pub food_suggestions: FoodSuggestions,
    pub home_remedies: Vec<String>,
    #[serde(default = "default_friendly_note")]
    pub friendly_note: String,
}

/// What kind of input produced an insight.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    File,
    Text,
    Vitals,
}

/// AI-derived insight document (`ai_insights` collection). Immutable.
///
/// `fileId` is a weak reference: files are never deleted by this service, so
/// cascade semantics are intentionally undefined and readers must tolerate a
/// dangling reference.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AIInsight {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    pub file_analysis: FileAnalysis,
    /// Raw upstream payload, kept opaque
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insight with its file back-reference expanded to the full document, the
/// shape the timeline serves. A dangling reference serializes as `fileId:
/// null` rather than being dropped.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedInsight {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub file_id: Option<File>,
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    pub file_analysis: FileAnalysis,
    pub created_at: DateTime<Utc>,
}

impl PopulatedInsight {
    pub fn new(insight: AIInsight, file: Option<File>) -> Self {
        PopulatedInsight {
            id: insight.id,
            user_id: insight.user_id,
            file_id: file,
            input_type: insight.input_type,
            user_input: insight.user_input,
            file_analysis: insight.file_analysis,
            created_at: insight.created_at,
        }
    }
}

use serde::{Deserialize, Serialize};

/// One prior turn, supplied by the client on every request (chat is
/// stateless server-side).
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Where the user is asking from: "report", "dashboard", "vitals"
    pub context: Option<String>,
    pub report_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub error: bool,
    pub response: String,
    pub sources: Vec<String>,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

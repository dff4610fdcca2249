use base64::Engine;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::database::MongoDB;
use crate::models::file::{File, FileType};
use crate::models::insight::{AIInsight, FileAnalysis, InputType};
use crate::services::gemini_service::{self, Attachment, TextGenerator};
use crate::utils::error::AppError;
use crate::utils::storage;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A fully received multipart upload, before persistence.
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub file_type: FileType,
}

pub struct FileAnalysisResult {
    pub analysis: FileAnalysis,
    pub file_id: String,
    pub insight_id: String,
}

pub struct TextAnalysisResult {
    pub analysis: FileAnalysis,
    pub insight_id: String,
}

/// Analyzes an uploaded report: persist the file, submit bytes inline to the
/// model, shape-validate the answer, persist the insight.
pub async fn analyze_file(
    db: &MongoDB,
    generator: &dyn TextGenerator,
    user_id: &str,
    upload: UploadedFile,
) -> Result<FileAnalysisResult, AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("No file uploaded".to_string()));
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File exceeds the 10MB upload limit".to_string(),
        ));
    }

    let stored_name = storage::stored_filename(&upload.original_name);
    let url = storage::save_upload(&stored_name, &upload.bytes).await?;

    let file_doc = File {
        id: ObjectId::new().to_hex(),
        user_id: user_id.to_string(),
        filename: stored_name,
        original_name: upload.original_name.clone(),
        mime_type: upload.mime_type.clone(),
        size: upload.bytes.len() as i64,
        url,
        file_type: upload.file_type,
        upload_date: Utc::now(),
    };

    db.collection::<File>("files").insert_one(&file_doc).await?;

    let attachment = Attachment {
        mime_type: upload.mime_type,
        data: base64::engine::general_purpose::STANDARD.encode(&upload.bytes),
    };
    let prompt = format!(
        "{}{}",
        gemini_service::HEALTH_ANALYSIS_PROMPT, "Medical report file analysis"
    );

    let outcome = generator.generate(&prompt, Some(attachment), None).await?;
    let analysis = gemini_service::parse_analysis(&outcome.text)?;

    let insight = AIInsight {
        id: ObjectId::new().to_hex(),
        user_id: user_id.to_string(),
        file_id: Some(file_doc.id.clone()),
        input_type: InputType::File,
        user_input: None,
        file_analysis: analysis.clone(),
        gemini_response: Some(outcome.raw),
        created_at: Utc::now(),
    };
    db.collection::<AIInsight>("ai_insights")
        .insert_one(&insight)
        .await?;

    log::info!(
        "🔍 File analyzed for user {}: file {} insight {}",
        user_id,
        file_doc.id,
        insight.id
    );

    Ok(FileAnalysisResult {
        analysis,
        file_id: file_doc.id,
        insight_id: insight.id,
    })
}

/// Analyzes free text: same prompt and validation path, no File row.
pub async fn analyze_text(
    db: &MongoDB,
    generator: &dyn TextGenerator,
    user_id: &str,
    text: &str,
) -> Result<TextAnalysisResult, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Text input required".to_string()));
    }

    let prompt = format!("{}{}", gemini_service::HEALTH_ANALYSIS_PROMPT, text);
    let outcome = generator.generate(&prompt, None, None).await?;
    let analysis = gemini_service::parse_analysis(&outcome.text)?;

    let insight = AIInsight {
        id: ObjectId::new().to_hex(),
        user_id: user_id.to_string(),
        file_id: None,
        input_type: InputType::Text,
        user_input: Some(text.to_string()),
        file_analysis: analysis.clone(),
        gemini_response: Some(outcome.raw),
        created_at: Utc::now(),
    };
    db.collection::<AIInsight>("ai_insights")
        .insert_one(&insight)
        .await?;

    log::info!("💬 Text analyzed for user {}: insight {}", user_id, insight.id);

    Ok(TextAnalysisResult {
        analysis,
        insight_id: insight.id,
    })
}

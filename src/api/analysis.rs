use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;

use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::models::file::FileType;
use crate::services::analysis_service::{self, UploadedFile};
use crate::services::gemini_service::GeminiClient;
use crate::utils::error::AppError;

/// POST /ai/analyze-file - multipart upload (`file` + optional `fileType`),
/// analyzed by the upstream model and persisted as File + AIInsight.
pub async fn analyze_file(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    gemini: web::Data<GeminiClient>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    log::info!("🔍 POST /ai/analyze-file - user: {}", user.sub);

    let upload = read_upload(payload).await?;
    let result =
        analysis_service::analyze_file(&db, gemini.get_ref(), &user.sub, upload).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "message": "File analyzed successfully",
        "data": result.analysis,
        "fileId": result.file_id,
        "insightId": result.insight_id,
    })))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

#[utoipa::path(
    post,
    path = "/ai/analyze-text",
    tag = "AI",
    request_body = AnalyzeTextRequest,
    responses(
        (status = 200, description = "Structured analysis of the text"),
        (status = 400, description = "Text input required"),
        (status = 502, description = "Upstream model failed or returned an unparseable answer")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze_text(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    gemini: web::Data<GeminiClient>,
    request: web::Json<AnalyzeTextRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💬 POST /ai/analyze-text - user: {}", user.sub);

    let result =
        analysis_service::analyze_text(&db, gemini.get_ref(), &user.sub, &request.text).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "message": "Text analyzed successfully",
        "data": result.analysis,
        "insightId": result.insight_id,
    })))
}

/// Drains the multipart stream into an `UploadedFile`. The `file` field is
/// required; `fileType` is an optional text field.
async fn read_upload(mut payload: Multipart) -> Result<UploadedFile, AppError> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut original_name = String::new();
    let mut mime_type = "application/octet-stream".to_string();
    let mut file_type = FileType::default();
    let mut saw_file = false;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?;

        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        match field_name.as_str() {
            "file" => {
                saw_file = true;
                if let Some(disposition) = field.content_disposition() {
                    if let Some(filename) = disposition.get_filename() {
                        original_name = filename.to_string();
                    }
                }
                if let Some(mime) = field.content_type() {
                    mime_type = mime.to_string();
                }
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| AppError::Validation(format!("Upload read error: {}", e)))?;
                    bytes.extend_from_slice(&chunk);
                }
            }
            "fileType" => {
                let mut value = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| AppError::Validation(format!("Upload read error: {}", e)))?;
                    value.extend_from_slice(&chunk);
                }
                file_type = FileType::parse(String::from_utf8_lossy(&value).trim());
            }
            _ => {}
        }
    }

    if !saw_file || bytes.is_empty() {
        return Err(AppError::Validation("No file uploaded".to_string()));
    }
    if original_name.is_empty() {
        original_name = "upload".to_string();
    }

    Ok(UploadedFile {
        original_name,
        mime_type,
        bytes,
        file_type,
    })
}

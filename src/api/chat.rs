use actix_web::{web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::services::chat_service;
use crate::services::gemini_service::GeminiClient;
use crate::utils::error::AppError;

#[utoipa::path(
    post,
    path = "/ai/chat",
    tag = "AI",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply with derived sources", body = ChatResponse),
        (status = 400, description = "Message is required"),
        (status = 502, description = "Upstream model failed"),
        (status = 504, description = "Upstream model timed out")
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    gemini: web::Data<GeminiClient>,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🤖 POST /ai/chat - user: {} context: {:?}",
        user.sub,
        request.context
    );

    let answer = chat_service::answer(&db, gemini.get_ref(), &user.sub, &request).await?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        error: false,
        response: answer.response,
        sources: answer.sources,
        confidence: answer.confidence,
        context: request.context.clone(),
    }))
}

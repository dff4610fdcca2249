use actix_web::{web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::services::timeline_service::{self, TimelineQuery};
use crate::utils::error::AppError;

#[utoipa::path(
    get,
    path = "/ai/timeline",
    tag = "AI",
    params(TimelineQuery),
    responses(
        (status = 200, description = "Unified activity feed, newest first"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_timeline(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<TimelineQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🕒 GET /ai/timeline - user: {}", user.sub);

    let entries = timeline_service::build_timeline(&db, &user.sub, &query).await?;

    log::info!("✅ Timeline: {} entries for user {}", entries.len(), user.sub);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "message": "Timeline fetched successfully",
        "data": entries,
    })))
}

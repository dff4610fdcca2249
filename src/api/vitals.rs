use actix_web::{web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::models::vitals::AddVitalsRequest;
use crate::services::vitals_service;
use crate::utils::error::AppError;

#[utoipa::path(
    post,
    path = "/ai/add-vitals",
    tag = "AI",
    request_body = AddVitalsRequest,
    responses(
        (status = 200, description = "Vitals stored, returned with derived status"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_vitals(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<AddVitalsRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("❤️  POST /ai/add-vitals - user: {}", user.sub);

    let (vitals, status) = vitals_service::add_vitals(&db, &user.sub, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "message": "Vitals recorded successfully",
        "data": vitals,
        "status": status,
    })))
}

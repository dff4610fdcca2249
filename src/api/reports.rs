use actix_web::{http::header, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::services::report_service;
use crate::utils::error::AppError;
use crate::utils::storage;

#[utoipa::path(
    get,
    path = "/ai/insights/{report_id}",
    tag = "AI",
    responses(
        (status = 200, description = "Normalized insight view with derived severity", body = report_service::InsightView),
        (status = 404, description = "No insights for this report, or not the caller's report")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_insights(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let report_id = path.into_inner();
    log::info!("📊 GET /ai/insights/{} - user: {}", report_id, user.sub);

    let view = report_service::get_insight_view(&db, &user.sub, &report_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "data": view,
    })))
}

/// GET /ai/report/{id} - metadata for one owned report.
pub async fn get_report(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let report_id = path.into_inner();
    log::info!("📄 GET /ai/report/{} - user: {}", report_id, user.sub);

    let report = report_service::get_report(&db, &user.sub, &report_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "data": report,
    })))
}

/// GET /ai/report/{id}/download - stored bytes as an attachment.
pub async fn download_report(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let report_id = path.into_inner();
    log::info!("📥 GET /ai/report/{}/download - user: {}", report_id, user.sub);

    let report = report_service::get_report(&db, &user.sub, &report_id).await?;
    let bytes = storage::read_stored(&report.url).await?;

    Ok(HttpResponse::Ok()
        .content_type(report.mime_type.clone())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report.original_name),
        ))
        .body(bytes))
}

/// GET /ai/report/{id}/preview - PDFs render inline; other types get a JSON
/// descriptor pointing at the download route.
pub async fn preview_report(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let report_id = path.into_inner();
    log::info!("🖼️  GET /ai/report/{}/preview - user: {}", report_id, user.sub);

    let report = report_service::get_report(&db, &user.sub, &report_id).await?;

    if report.mime_type == "application/pdf" {
        let bytes = storage::read_stored(&report.url).await?;
        return Ok(HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", report.original_name),
            ))
            .body(bytes));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "data": {
            "fileUrl": format!("/ai/report/{}/download", report_id),
            "mimeType": report.mime_type,
            "originalName": report.original_name,
        },
    })))
}

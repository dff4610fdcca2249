use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::models::user::UserInfo;
use crate::services::auth_service::{self, LoginRequest, SignupRequest};
use crate::services::verification_service;
use crate::utils::error::AppError;

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Registration successful", body = auth_service::AuthResponse),
        (status = 400, description = "Invalid request or user already exists")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/signup - email: {}", request.email);

    let response = auth_service::signup(&db, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = auth_service::AuthResponse),
        (status = 400, description = "Unknown user or invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let response = auth_service::login(&db, &request).await?;
    log::info!("✅ Login successful: {}", request.email);
    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/user - current account from the bearer token, without the hash.
#[utoipa::path(
    get,
    path = "/auth/user",
    tag = "Auth",
    responses(
        (status = 200, description = "User data fetched", body = UserInfo),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(db: web::Data<MongoDB>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /auth/user");

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthenticated)?;

    let claims = auth_service::verify_token(token)?;
    let user = auth_service::find_user_by_id(&db, &claims.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "error": false,
        "message": "User data fetched successfully!",
        "data": UserInfo::from(&user),
    })))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// POST /confirm-email/send - issue a verification code for a new address.
pub async fn send_verification(
    db: web::Data<MongoDB>,
    request: web::Json<SendCodeRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📧 POST /confirm-email/send - email: {}", request.email);

    verification_service::issue_code(&db, &request.email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Verification code sent to email",
    })))
}

/// POST /confirm-email/verify - check and consume a pending code.
pub async fn verify_email(
    db: web::Data<MongoDB>,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✉️  POST /confirm-email/verify - email: {}", request.email);

    verification_service::verify_code(&db, &request.email, &request.code).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Email verified",
    })))
}

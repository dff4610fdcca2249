use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::api::metrics;

/// Application error taxonomy. Every failure that crosses the route boundary
/// is one of these variants and renders as `{error: true, message}`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Missing or malformed caller input
    Validation(String),
    /// No bearer credential on a protected route
    Unauthenticated,
    /// Bearer credential failed signature or expiry verification
    InvalidToken,
    /// Token verified but the referenced user no longer exists
    UserNotFound,
    /// Record absent, or owned by a different user (never leak existence)
    NotFound(String),
    /// The external generative model call failed
    UpstreamUnavailable(String),
    /// The external model returned output that does not parse per schema
    MalformedResponse(String),
    /// The external model call exceeded its deadline
    Timeout(String),
    /// Database failure
    Database(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::Unauthenticated => write!(f, "Token not provided!"),
            AppError::InvalidToken => write!(f, "Invalid token!"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::UpstreamUnavailable(msg) => write!(f, "AI service unavailable: {}", msg),
            AppError::MalformedResponse(msg) => write!(f, "AI returned invalid response: {}", msg),
            AppError::Timeout(msg) => write!(f, "AI request timed out: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable(_) | AppError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        metrics::increment_error_count();
        log::warn!("❌ {} -> {}", self.status_code(), self);
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": true,
            "message": self.to_string(),
        }))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UpstreamUnavailable("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::MalformedResponse("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Timeout("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_does_not_echo_internals() {
        let e = AppError::NotFound("Report not found".into());
        assert_eq!(e.to_string(), "Report not found");
    }
}

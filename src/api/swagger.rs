use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HealthMate Service API",
        version = "1.0.0",
        description = "Personal health-record backend. \n\n**Authentication:** All `/ai` endpoints require a JWT Bearer token.\n\n**Features:**\n- Medical report upload and AI analysis\n- Free-text analysis\n- Manual vitals logging with derived status\n- Unified activity timeline\n- Conversational assistant over the user's own health data",
        contact(
            name = "HealthMate Team",
            email = "support@healthmate.app"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::get_user,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // AI endpoints
        crate::api::analysis::analyze_text,
        crate::api::vitals::add_vitals,
        crate::api::timeline::get_timeline,
        crate::api::chat::chat,
        crate::api::reports::get_insights,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::user::UserInfo,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // AI
            crate::api::analysis::AnalyzeTextRequest,
            crate::models::insight::FileAnalysis,
            crate::models::insight::FoodSuggestions,
            crate::models::vitals::AddVitalsRequest,
            crate::models::vitals::BloodPressure,
            crate::models::vitals::VitalsStatus,
            crate::models::chat::ChatRequest,
            crate::models::chat::ChatMessage,
            crate::models::chat::ChatResponse,
            crate::services::report_service::InsightView,
            crate::services::report_service::RatedFinding,
            crate::services::report_service::Severity,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and account lookup."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
        (name = "AI", description = "Report analysis, vitals, timeline and the conversational assistant."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

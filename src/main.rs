mod api;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use services::gemini_service::GeminiClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    log::info!("🚀 Starting HealthMate Service...");
    log::info!("📊 Database: {}", database_url);

    if env::var("GEMINI_API_KEY").is_err() {
        log::warn!("⚠️  GEMINI_API_KEY not set - analysis and chat endpoints will fail upstream");
    }

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());
    let gemini_data = web::Data::new(GeminiClient::new());

    log::info!("✅ MongoDB connected successfully");
    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(gemini_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(api::auth::signup))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/user", web::get().to(api::auth::get_user)),
            )
            // Email verification codes (issued before signup)
            .service(
                web::scope("/confirm-email")
                    .route("/send", web::post().to(api::auth::send_verification))
                    .route("/verify", web::post().to(api::auth::verify_email)),
            )
            // ==================== HEALTH DATA (JWT required) ====================
            .service(
                web::scope("/ai")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/analyze-file", web::post().to(api::analysis::analyze_file))
                    .route("/analyze-text", web::post().to(api::analysis::analyze_text))
                    .route("/add-vitals", web::post().to(api::vitals::add_vitals))
                    .route("/timeline", web::get().to(api::timeline::get_timeline))
                    .route("/chat", web::post().to(api::chat::chat))
                    .route("/insights/{report_id}", web::get().to(api::reports::get_insights))
                    .route("/report/{id}", web::get().to(api::reports::get_report))
                    .route(
                        "/report/{id}/download",
                        web::get().to(api::reports::download_report),
                    )
                    .route(
                        "/report/{id}/preview",
                        web::get().to(api::reports::preview_report),
                    ),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}

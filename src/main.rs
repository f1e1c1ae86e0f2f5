mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::payment::PaymentService;
use services::sms::SmsService;
use services::upload::UploadConfig;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Identity
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::verify_login_otp,
        crate::handlers::user::get_all_users,
        crate::handlers::user::update_profile,
        // Questions
        crate::handlers::question::ask_question,
        crate::handlers::question::get_all_questions,
        crate::handlers::question::delete_question,
        crate::handlers::question::vote_question,
        // Answers
        crate::handlers::answer::post_answer,
        crate::handlers::answer::delete_answer,
        crate::handlers::answer::vote_answer,
        // Rewards
        crate::handlers::reward::reward_status,
        crate::handlers::reward::transfer_points,
        crate::handlers::reward::leaderboard,
        crate::handlers::reward::search_users,
        // Subscriptions
        crate::handlers::subscription::get_plans,
        crate::handlers::subscription::get_user_subscription,
        crate::handlers::subscription::can_post_question,
        crate::handlers::subscription::create_payment,
        crate::handlers::subscription::verify_payment,
        crate::handlers::subscription::cancel_subscription,
        // Language
        crate::handlers::language::get_language,
        crate::handlers::language::request_change,
        crate::handlers::language::verify_change,
        // Security
        crate::handlers::login_history::get_login_history,
        crate::handlers::password_reset::request_reset,
        crate::handlers::password_reset::reset_password,
        crate::handlers::password_reset::verify_token,
        // Social feed
        crate::handlers::post::create_post,
        crate::handlers::post::get_feed,
        crate::handlers::post::like_post,
        crate::handlers::post::comment_on_post,
        crate::handlers::post::share_post,
        crate::handlers::post::daily_status,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            // Identity
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::VerifyLoginOtpRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::LoginPendingResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::user::UpdateProfileRequest,
            // Questions / answers
            crate::handlers::question::AskQuestionRequest,
            crate::handlers::question::QuestionVoteRequest,
            crate::handlers::answer::PostAnswerRequest,
            crate::handlers::answer::AnswerVoteRequest,
            crate::handlers::answer::DeleteAnswerRequest,
            // Rewards
            crate::handlers::reward::TransferRequest,
            crate::handlers::reward::RewardStatusResponse,
            crate::handlers::reward::UserSearchResult,
            crate::services::reward::LeaderboardEntry,
            // Subscriptions
            crate::handlers::subscription::CreatePaymentRequest,
            crate::handlers::subscription::VerifyPaymentRequest,
            crate::services::subscription::CanPostStatus,
            crate::services::subscription::PaymentDetails,
            // Language
            crate::handlers::language::RequestChangeRequest,
            crate::handlers::language::VerifyChangeRequest,
            // Security
            crate::handlers::password_reset::RequestResetRequest,
            crate::handlers::password_reset::ResetPasswordRequest,
            // Social feed
            crate::handlers::post::CommentRequest,
            crate::services::post::FeedPost,
            crate::services::post::DailyPostStatus,
            crate::services::post::MediaItem,
        )
    ),
    tags(
        (name = "identity", description = "Signup, login, and profile operations"),
        (name = "questions", description = "Question posting and voting"),
        (name = "answers", description = "Answer posting and voting"),
        (name = "rewards", description = "Points ledger, transfers, leaderboard"),
        (name = "subscriptions", description = "Plans and payment lifecycle"),
        (name = "language", description = "Language preference with OTP verification"),
        (name = "security", description = "Login history and password reset"),
        (name = "posts", description = "Social feed operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qstack=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    // Initialize JWT config
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting QStack API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    let upload_config = UploadConfig {
        upload_dir: upload_dir.clone(),
    };

    let email_service = services::email::EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    let sms_service = SmsService::from_env();
    if sms_service.is_configured() {
        tracing::info!("SMS gateway configured");
    } else {
        tracing::warn!("SMS gateway not configured, SMS sends will be skipped");
    }

    let payment_service = PaymentService::from_env();

    let app = create_app(&upload_dir)
        .layer(Extension(db))
        .layer(Extension(upload_config))
        .layer(Extension(email_service))
        .layer(Extension(sms_service))
        .layer(Extension(payment_service));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    // Upload directory — create if needed
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    std::fs::create_dir_all(&upload_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create upload directory '{}': {}", upload_dir, e)
    })?;

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(upload_dir: &str) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // room for a full media batch (5 files x 10 MB) plus form overhead
        .layer(axum::extract::DefaultBodyLimit::max(60 * 1024 * 1024))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "QStack API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}

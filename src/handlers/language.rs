use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::email::EmailService;
use crate::services::language::{LanguageService, OtpMethod};
use crate::services::sms::SmsService;
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestChangeRequest {
    /// Target language code (en/es/fr/de/hi)
    pub language: String,
    /// Verification channel: "email" or "sms"
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "email".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyChangeRequest {
    pub otp: String,
}

#[utoipa::path(
    get,
    path = "/language",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current language preference", body = serde_json::Value),
    ),
    tag = "language"
)]
pub async fn get_language(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = LanguageService::new(db);
    let row = service.get_or_create(auth_user.user_id).await?;
    Ok(ApiResponse::ok(json!({ "language": row.language })))
}

#[utoipa::path(
    post,
    path = "/language/request-change",
    security(("jwt_token" = [])),
    request_body = RequestChangeRequest,
    responses(
        (status = 200, description = "Verification code sent", body = serde_json::Value),
        (status = 400, description = "Unsupported language or method", body = AppError),
    ),
    tag = "language"
)]
pub async fn request_change(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Extension(sms_service): Extension<SmsService>,
    auth_user: AuthUser,
    Json(payload): Json<RequestChangeRequest>,
) -> AppResult<impl IntoResponse> {
    let method = OtpMethod::parse(&payload.method)
        .ok_or_else(|| AppError::Validation("Invalid verification method".to_string()))?;

    let service = LanguageService::new(db);
    service
        .request_change(
            auth_user.user_id,
            &payload.language,
            method,
            &email_service,
            &sms_service,
        )
        .await?;

    Ok(ApiResponse::<serde_json::Value>::message_only(format!(
        "OTP sent to your {}",
        method.as_str()
    )))
}

#[utoipa::path(
    post,
    path = "/language/verify-change",
    security(("jwt_token" = [])),
    request_body = VerifyChangeRequest,
    responses(
        (status = 200, description = "Language changed", body = serde_json::Value),
        (status = 400, description = "Invalid or expired OTP", body = AppError),
    ),
    tag = "language"
)]
pub async fn verify_change(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<VerifyChangeRequest>,
) -> AppResult<impl IntoResponse> {
    let service = LanguageService::new(db);
    let row = service.verify_change(auth_user.user_id, &payload.otp).await?;

    Ok(ApiResponse::with_message(
        json!({ "language": row.language }),
        format!("Language successfully changed to {}", row.language),
    ))
}

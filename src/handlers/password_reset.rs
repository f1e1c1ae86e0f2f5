use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::email::EmailService;
use crate::services::password_reset::PasswordResetService;
use crate::services::sms::SmsService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestResetRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
}

#[utoipa::path(
    post,
    path = "/password-reset/request-reset",
    request_body = RequestResetRequest,
    responses(
        (status = 200, description = "Reset token issued and sent", body = serde_json::Value),
        (status = 404, description = "No matching user", body = AppError),
        (status = 429, description = "Daily reset-request limit reached", body = AppError),
    ),
    tag = "security"
)]
pub async fn request_reset(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Extension(sms_service): Extension<SmsService>,
    Json(payload): Json<RequestResetRequest>,
) -> AppResult<impl IntoResponse> {
    let service = PasswordResetService::new(db);
    let channel = service
        .request_reset(
            payload.email.as_deref(),
            payload.phone.as_deref(),
            &email_service,
            &sms_service,
        )
        .await?;

    Ok(ApiResponse::<serde_json::Value>::message_only(format!(
        "Password reset instructions have been sent to your {}",
        channel
    )))
}

#[utoipa::path(
    post,
    path = "/password-reset/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, new password sent", body = serde_json::Value),
        (status = 400, description = "Invalid or expired reset token", body = AppError),
        (status = 429, description = "Too many attempts on this token", body = AppError),
    ),
    tag = "security"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Extension(sms_service): Extension<SmsService>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.reset_token.trim().is_empty() {
        return Err(AppError::Validation("Reset token is required".to_string()));
    }

    let service = PasswordResetService::new(db);
    service
        .reset_password(&payload.reset_token, &email_service, &sms_service)
        .await?;

    Ok(ApiResponse::<serde_json::Value>::message_only(
        "Password reset successful. Your new password has been sent to your registered contact."
            .to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/password-reset/verify-token/{reset_token}",
    params(("reset_token" = String, Path, description = "Reset token to check")),
    responses(
        (status = 200, description = "Token is valid", body = serde_json::Value),
        (status = 400, description = "Invalid or expired reset token", body = AppError),
    ),
    tag = "security"
)]
pub async fn verify_token(
    Extension(db): Extension<DatabaseConnection>,
    Path(reset_token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = PasswordResetService::new(db);
    let (reset_type, reset_value) = service.verify_token(&reset_token).await?;

    Ok(ApiResponse::with_message(
        json!({ "reset_type": reset_type, "reset_value": reset_value }),
        "Reset token is valid".to_string(),
    ))
}

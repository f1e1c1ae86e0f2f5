use crate::error::{AppError, AppResult};
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, LoginOutcome};
use crate::services::email::EmailService;
use crate::utils::ClientInfo;
use axum::{
    extract::ConnectInfo,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address (unique)
    #[validate(email)]
    pub email: String,
    /// Password (min 6 characters)
    #[validate(length(min = 6))]
    pub password: String,
    /// Phone number in E.164 form (optional, unique)
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyLoginOtpRequest {
    pub user_id: i32,
    pub otp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub about: Option<String>,
    pub tags: serde_json::Value,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            about: user.about,
            tags: user.tags,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginPendingResponse {
    pub requires_otp: bool,
    pub user_id: i32,
}

fn client_from_headers(headers: &HeaderMap) -> ClientInfo {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    ClientInfo::parse(user_agent)
}

#[utoipa::path(
    post,
    path = "/user/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "User already exists", body = AppError),
    ),
    tag = "identity"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    let (user, token) = service
        .signup(
            &payload.name,
            &payload.email,
            &payload.password,
            payload.phone.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful or OTP required", body = AuthResponse),
        (status = 400, description = "Invalid password", body = AppError),
        (status = 403, description = "Outside the permitted access window", body = AppError),
        (status = 404, description = "User does not exist", body = AppError),
    ),
    tag = "identity"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<axum::response::Response> {
    let client = client_from_headers(&headers);
    let ip = addr.ip().to_string();

    let service = AuthService::new(db);
    let outcome = service
        .login(&payload.email, &payload.password, &client, &ip, &email_service)
        .await?;

    Ok(match outcome {
        LoginOutcome::Success { user, token } => ApiResponse::ok(AuthResponse {
            user: user.into(),
            token,
        })
        .into_response(),
        LoginOutcome::OtpRequired { user_id } => ApiResponse::with_message(
            LoginPendingResponse {
                requires_otp: true,
                user_id,
            },
            "OTP sent to your email. Please verify to complete login.".to_string(),
        )
        .into_response(),
    })
}

#[utoipa::path(
    post,
    path = "/user/verify-login-otp",
    request_body = VerifyLoginOtpRequest,
    responses(
        (status = 200, description = "Login completed", body = AuthResponse),
        (status = 400, description = "Invalid or expired OTP", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "identity"
)]
pub async fn verify_login_otp(
    Extension(db): Extension<DatabaseConnection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VerifyLoginOtpRequest>,
) -> AppResult<impl IntoResponse> {
    let client = client_from_headers(&headers);
    let ip = addr.ip().to_string();

    let service = AuthService::new(db);
    let (user, token) = service
        .verify_login_otp(payload.user_id, &payload.otp, &client, &ip)
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        user: user.into(),
        token,
    }))
}

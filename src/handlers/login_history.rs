use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::login_history::LoginHistoryService;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;

const HISTORY_LIMIT: u64 = 20;

#[utoipa::path(
    get,
    path = "/login-history",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Recent login attempts, newest first", body = serde_json::Value),
    ),
    tag = "security"
)]
pub async fn get_login_history(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = LoginHistoryService::new(db);
    let history = service.history(auth_user.user_id, HISTORY_LIMIT).await?;
    Ok(ApiResponse::ok(history))
}

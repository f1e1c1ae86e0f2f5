use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserResponse;
use crate::middleware::AuthUser;
use crate::response::DataResponse;
use crate::services::auth::AuthService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub about: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/user/getallusers",
    responses(
        (status = 200, description = "All registered users", body = [UserResponse]),
    ),
    tag = "identity"
)]
pub async fn get_all_users(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let users: Vec<UserResponse> = service
        .all_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(DataResponse::new(users))
}

#[utoipa::path(
    patch,
    path = "/user/update/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 403, description = "Not your profile", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "identity"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    if id != auth_user.user_id {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let service = AuthService::new(db);
    let user = service
        .update_profile(id, &payload.name, payload.about.as_deref(), &payload.tags)
        .await?;

    Ok(DataResponse::new(UserResponse::from(user)))
}

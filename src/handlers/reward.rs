use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::reward::{LeaderboardEntry, RewardService};
use axum::{extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const LEADERBOARD_LIMIT: u64 = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub recipient_id: i32,
    pub points: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchUsersQuery {
    pub q: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RewardStatusResponse {
    pub points: i32,
    pub total_points_earned: i32,
    pub total_points_spent: i32,
    pub badges: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSearchResult {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/reward/status",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current account balance and badges", body = RewardStatusResponse),
    ),
    tag = "rewards"
)]
pub async fn reward_status(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = RewardService::new(db);
    let (account, badges) = service.status(auth_user.user_id).await?;

    Ok(ApiResponse::ok(RewardStatusResponse {
        points: account.points,
        total_points_earned: account.total_points_earned,
        total_points_spent: account.total_points_spent,
        badges,
    }))
}

#[utoipa::path(
    post,
    path = "/reward/transfer",
    security(("jwt_token" = [])),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Points transferred", body = serde_json::Value),
        (status = 400, description = "Insufficient points or invalid transfer", body = AppError),
        (status = 404, description = "Recipient not found", body = AppError),
    ),
    tag = "rewards"
)]
pub async fn transfer_points(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<TransferRequest>,
) -> AppResult<impl IntoResponse> {
    let service = RewardService::new(db);
    service
        .transfer(auth_user.user_id, payload.recipient_id, payload.points)
        .await?;

    Ok(ApiResponse::<serde_json::Value>::message_only(format!(
        "Successfully transferred {} points",
        payload.points
    )))
}

#[utoipa::path(
    get,
    path = "/reward/leaderboard",
    responses(
        (status = 200, description = "Top earners by lifetime points", body = [LeaderboardEntry]),
    ),
    tag = "rewards"
)]
pub async fn leaderboard(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = RewardService::new(db);
    let entries = service.leaderboard(LEADERBOARD_LIMIT).await?;
    Ok(ApiResponse::ok(entries))
}

#[utoipa::path(
    get,
    path = "/reward/search-users",
    security(("jwt_token" = [])),
    params(("q" = String, Query, description = "Name or email fragment")),
    responses(
        (status = 200, description = "Matching users", body = [UserSearchResult]),
    ),
    tag = "rewards"
)]
pub async fn search_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<SearchUsersQuery>,
) -> AppResult<impl IntoResponse> {
    if query.q.trim().is_empty() {
        return Err(AppError::Validation("Search query is required".to_string()));
    }

    let service = RewardService::new(db);
    let users: Vec<UserSearchResult> = service
        .search_users(&query.q, auth_user.user_id)
        .await?
        .into_iter()
        .map(|u| UserSearchResult {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();

    Ok(ApiResponse::ok(users))
}

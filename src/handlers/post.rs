use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::post::{DailyPostStatus, FeedPost, MediaItem, PostService};
use crate::services::upload::{UploadConfig, UploadService, MAX_FILES_PER_POST};
use axum::{
    extract::{Multipart, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/posts/create",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Post created", body = serde_json::Value),
        (status = 403, description = "No friends yet", body = AppError),
        (status = 429, description = "Daily post limit reached", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut content = String::new();
    let mut media: Vec<MediaItem> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read content: {}", e)))?;
            }
            Some("media") => {
                if media.len() >= MAX_FILES_PER_POST {
                    return Err(AppError::Validation(format!(
                        "At most {} media files per post",
                        MAX_FILES_PER_POST
                    )));
                }

                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file data: {}", e))
                })?;

                let (kind, url) =
                    UploadService::save_media(&upload_config, &data, &content_type, "posts")
                        .await?;
                media.push(MediaItem {
                    kind: kind.as_str().to_string(),
                    url,
                });
            }
            _ => continue,
        }
    }

    let service = PostService::new(db);
    let (post, remaining) = service.create(auth_user.user_id, &content, &media).await?;

    Ok(ApiResponse::with_message(
        json!({ "post": post, "remaining_posts": remaining }),
        "Post created successfully".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/posts/feed",
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (max 50)"),
    ),
    responses(
        (status = 200, description = "Public feed, newest first", body = PaginatedResponse<FeedPost>),
    ),
    tag = "posts"
)]
pub async fn get_feed(
    Extension(db): Extension<DatabaseConnection>,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = pagination.page.unwrap_or(1).max(1);
    let per_page = pagination.per_page.unwrap_or(10).clamp(1, 50);

    let service = PostService::new(db);
    let (posts, total) = service.feed(page, per_page).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        posts, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/like",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = serde_json::Value),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn like_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let (liked, likes) = service.like(post_id, auth_user.user_id).await?;

    let message = if liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };
    Ok(ApiResponse::with_message(
        json!({ "liked": liked, "likes": likes }),
        message.to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment added", body = serde_json::Value),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn comment_on_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let (comment, total) = service
        .comment(post_id, auth_user.user_id, &payload.content)
        .await?;

    Ok(ApiResponse::with_message(
        json!({ "comment": comment, "total_comments": total }),
        "Comment added successfully".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/share",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post shared", body = serde_json::Value),
        (status = 404, description = "Post not found", body = AppError),
        (status = 409, description = "Already shared", body = AppError),
    ),
    tag = "posts"
)]
pub async fn share_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let shares = service.share(post_id, auth_user.user_id).await?;

    Ok(ApiResponse::with_message(
        json!({ "shares": shares }),
        "Post shared successfully".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/posts/daily-status",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Today's posting allowance", body = DailyPostStatus),
    ),
    tag = "posts"
)]
pub async fn daily_status(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let status = service.daily_status(auth_user.user_id).await?;
    Ok(ApiResponse::ok(status))
}

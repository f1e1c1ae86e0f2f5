use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::DataResponse;
use crate::services::answer::AnswerService;
use crate::services::question::QuestionService;
use crate::services::reward::MILESTONE_BONUS;
use crate::services::vote::{VoteDirection, VoteService, VoteTarget};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostAnswerRequest {
    #[validate(length(min = 1))]
    pub answer_body: String,
    /// Display name to show beside the answer
    pub user_answered: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerVoteRequest {
    /// "upvote" or "downvote"
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteAnswerRequest {
    pub answer_id: i32,
}

#[utoipa::path(
    post,
    path = "/answer/postanswer/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    request_body = PostAnswerRequest,
    responses(
        (status = 200, description = "Updated question with answers", body = serde_json::Value),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "answers"
)]
pub async fn post_answer(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(question_id): Path<i32>,
    Json(payload): Json<PostAnswerRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AnswerService::new(db.clone());
    service
        .submit(
            question_id,
            auth_user.user_id,
            &payload.answer_body,
            payload.user_answered.as_deref(),
        )
        .await?;

    let question = QuestionService::new(db).get_with_answers(question_id).await?;
    Ok(DataResponse::new(question))
}

#[utoipa::path(
    delete,
    path = "/answer/delete/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    request_body = DeleteAnswerRequest,
    responses(
        (status = 200, description = "Answer deleted", body = serde_json::Value),
        (status = 403, description = "Not your answer", body = AppError),
        (status = 404, description = "Answer not found", body = AppError),
    ),
    tag = "answers"
)]
pub async fn delete_answer(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(_question_id): Path<i32>,
    Json(payload): Json<DeleteAnswerRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AnswerService::new(db);
    service.delete(payload.answer_id, auth_user.user_id).await?;
    Ok(Json(json!({ "message": "answer deleted successfully" })))
}

#[utoipa::path(
    patch,
    path = "/answer/vote/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Answer ID")),
    request_body = AnswerVoteRequest,
    responses(
        (status = 200, description = "Updated vote counts", body = serde_json::Value),
        (status = 404, description = "Answer not found", body = AppError),
    ),
    tag = "answers"
)]
pub async fn vote_answer(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AnswerVoteRequest>,
) -> AppResult<impl IntoResponse> {
    let direction = VoteDirection::parse(&payload.value)
        .ok_or_else(|| AppError::Validation("Vote value must be upvote or downvote".to_string()))?;

    let votes = VoteService::new(db.clone());
    let outcome = votes
        .vote(auth_user.user_id, VoteTarget::Answer, id, direction)
        .await?;

    let answer = crate::models::Answer::find_by_id(id)
        .one(&db)
        .await
        .map_err(crate::error::AppError::from)?
        .ok_or_else(|| AppError::NotFound("answer not found".to_string()))?;

    let points_awarded = if outcome.milestone_awarded {
        MILESTONE_BONUS
    } else {
        0
    };

    Ok(Json(json!({
        "data": answer,
        "points_awarded": points_awarded,
    })))
}

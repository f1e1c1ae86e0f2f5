use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::DataResponse;
use crate::services::question::{QuestionService, QuestionWithAnswers};
use crate::services::vote::{VoteDirection, VoteService, VoteTarget};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AskQuestionRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionVoteRequest {
    /// "upvote" or "downvote"
    pub value: String,
}

#[utoipa::path(
    post,
    path = "/question/ask",
    security(("jwt_token" = [])),
    request_body = AskQuestionRequest,
    responses(
        (status = 200, description = "Question posted", body = serde_json::Value),
        (status = 429, description = "Daily question limit reached", body = AppError),
    ),
    tag = "questions"
)]
pub async fn ask_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<AskQuestionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = QuestionService::new(db);
    let question = service
        .ask(
            auth_user.user_id,
            &payload.title,
            &payload.body,
            &payload.tags,
        )
        .await?;

    Ok(DataResponse::new(question))
}

#[utoipa::path(
    get,
    path = "/question/getallquestion",
    responses(
        (status = 200, description = "All questions with answers", body = serde_json::Value),
    ),
    tag = "questions"
)]
pub async fn get_all_questions(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = QuestionService::new(db);
    let questions: Vec<QuestionWithAnswers> = service.all().await?;
    Ok(DataResponse::new(questions))
}

#[utoipa::path(
    delete,
    path = "/question/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question deleted", body = serde_json::Value),
        (status = 403, description = "Not your question", body = AppError),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn delete_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = QuestionService::new(db);
    service.delete(id, auth_user.user_id).await?;
    Ok(Json(json!({ "message": "question deleted" })))
}

#[utoipa::path(
    patch,
    path = "/question/vote/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    request_body = QuestionVoteRequest,
    responses(
        (status = 200, description = "Updated question", body = serde_json::Value),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn vote_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<QuestionVoteRequest>,
) -> AppResult<impl IntoResponse> {
    let direction = VoteDirection::parse(&payload.value)
        .ok_or_else(|| AppError::Validation("Vote value must be upvote or downvote".to_string()))?;

    let votes = VoteService::new(db.clone());
    votes
        .vote(auth_user.user_id, VoteTarget::Question, id, direction)
        .await?;

    let question = QuestionService::new(db).get_with_answers(id).await?;
    Ok(DataResponse::new(question))
}

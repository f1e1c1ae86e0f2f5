use crate::{
    error::{AppError, AppResult},
    models::{
        question, vote, Answer, AnswerModel, Question, QuestionModel, User, Vote,
    },
    services::{
        daily_limit::{can_act, today, DailyLimitService},
        subscription::SubscriptionService,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct QuestionWithAnswers {
    #[serde(flatten)]
    pub question: QuestionModel,
    pub user_name: Option<String>,
    pub answers: Vec<AnswerModel>,
}

pub struct QuestionService {
    db: DatabaseConnection,
}

impl QuestionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Post a question, spending one unit of the asker's daily allowance.
    /// The allowance follows the live plan (or the Free plan) on every call.
    pub async fn ask(
        &self,
        user_id: i32,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> AppResult<QuestionModel> {
        let subscriptions = SubscriptionService::new(self.db.clone());
        let Some((_, max_questions)) = subscriptions.question_quota(user_id).await? else {
            return Err(AppError::Validation("Free plan not configured".to_string()));
        };

        let limits = DailyLimitService::new(self.db.clone());
        let date = today();
        let counter = limits
            .get_or_init_question(user_id, date, max_questions)
            .await?;

        if !can_act(counter.question_count, counter.max_questions) {
            return Err(AppError::RateLimited(format!(
                "You have reached your daily question limit of {}. Come back tomorrow!",
                counter.max_questions
            )));
        }

        let row = question::ActiveModel {
            user_id: Set(Some(user_id)),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            tags: Set(serde_json::json!(tags)),
            upvotes: Set(0),
            downvotes: Set(0),
            answer_count: Set(0),
            asked_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        let created = row.insert(&self.db).await?;

        limits.increment_question(user_id, date).await?;

        Ok(created)
    }

    /// All questions, newest first, each with its author name and answers.
    pub async fn all(&self) -> AppResult<Vec<QuestionWithAnswers>> {
        let rows = Question::find()
            .order_by_desc(question::Column::AskedAt)
            .find_with_related(Answer)
            .all(&self.db)
            .await?;

        let user_ids: Vec<i32> = rows
            .iter()
            .filter_map(|(q, _)| q.user_id)
            .collect();
        let names: HashMap<i32, String> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            User::find()
                .filter(crate::models::user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|(q, answers)| {
                let user_name = q.user_id.and_then(|id| names.get(&id).cloned());
                QuestionWithAnswers {
                    question: q,
                    user_name,
                    answers,
                }
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<QuestionModel> {
        Question::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("question not found".to_string()))
    }

    /// One question with its author name and answers, the shape the legacy
    /// endpoints return after a mutation.
    pub async fn get_with_answers(&self, id: i32) -> AppResult<QuestionWithAnswers> {
        let question = self.get(id).await?;

        let user_name = match question.user_id {
            Some(user_id) => User::find_by_id(user_id)
                .one(&self.db)
                .await?
                .map(|u| u.name),
            None => None,
        };

        let answers = Answer::find()
            .filter(crate::models::answer::Column::QuestionId.eq(id))
            .order_by_asc(crate::models::answer::Column::AnsweredAt)
            .all(&self.db)
            .await?;

        Ok(QuestionWithAnswers {
            question,
            user_name,
            answers,
        })
    }

    /// Delete a question with its answers and every vote pointing at them.
    pub async fn delete(&self, question_id: i32, requester_id: i32) -> AppResult<()> {
        let question = self.get(question_id).await?;

        if question.user_id.is_some_and(|owner| owner != requester_id) {
            return Err(AppError::Forbidden(
                "You can only delete your own questions".to_string(),
            ));
        }

        let answer_ids: Vec<i32> = Answer::find()
            .filter(crate::models::answer::Column::QuestionId.eq(question_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let txn = self.db.begin().await?;

        let mut vote_filter = Condition::any().add(
            Condition::all()
                .add(vote::Column::TargetType.eq("question"))
                .add(vote::Column::TargetId.eq(question_id)),
        );
        if !answer_ids.is_empty() {
            vote_filter = vote_filter.add(
                Condition::all()
                    .add(vote::Column::TargetType.eq("answer"))
                    .add(vote::Column::TargetId.is_in(answer_ids)),
            );
        }
        Vote::delete_many().filter(vote_filter).exec(&txn).await?;

        // answers cascade with the question row
        Question::delete_by_id(question_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}

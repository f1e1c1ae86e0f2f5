use crate::{
    error::{AppError, AppResult},
    models::{answer, question, vote, Answer, AnswerModel, Question, Vote},
    services::reward::{RewardService, ANSWER_REWARD, MILESTONE_BONUS, MILESTONE_UPVOTES},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

/// Points taken back when an answer is deleted: the submission reward,
/// plus the milestone bonus if the answer had reached it.
pub fn deletion_deduction(upvotes: i32) -> i32 {
    if upvotes >= MILESTONE_UPVOTES {
        ANSWER_REWARD + MILESTONE_BONUS
    } else {
        ANSWER_REWARD
    }
}

pub struct AnswerService {
    db: DatabaseConnection,
}

impl AnswerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submit an answer: +5 to the author, and the question's answer
    /// counter moves up.
    pub async fn submit(
        &self,
        question_id: i32,
        user_id: i32,
        body: &str,
        answered_by: Option<&str>,
    ) -> AppResult<AnswerModel> {
        Question::find_by_id(question_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("question not found".to_string()))?;

        let row = answer::ActiveModel {
            question_id: Set(question_id),
            user_id: Set(Some(user_id)),
            body: Set(body.to_string()),
            answered_by: Set(answered_by.map(str::to_string)),
            upvotes: Set(0),
            downvotes: Set(0),
            answered_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        let created = row.insert(&self.db).await?;

        RewardService::new(self.db.clone())
            .grant(user_id, ANSWER_REWARD, None)
            .await?;

        Question::update_many()
            .col_expr(
                question::Column::AnswerCount,
                Expr::col(question::Column::AnswerCount).add(1),
            )
            .filter(question::Column::Id.eq(question_id))
            .exec(&self.db)
            .await?;

        Ok(created)
    }

    /// Delete an answer, reversing its rewards. The deduction is a single
    /// conditional spend — skipped entirely when the balance cannot cover
    /// it.
    pub async fn delete(&self, answer_id: i32, requester_id: i32) -> AppResult<()> {
        let answer = Answer::find_by_id(answer_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("answer not found".to_string()))?;

        if answer.user_id.is_some_and(|owner| owner != requester_id) {
            return Err(AppError::Forbidden(
                "You can only delete your own answers".to_string(),
            ));
        }

        if let Some(owner_id) = answer.user_id {
            let points = deletion_deduction(answer.upvotes);
            let applied = RewardService::new(self.db.clone())
                .deduct(owner_id, points)
                .await?;
            if !applied {
                tracing::debug!(
                    owner_id,
                    points,
                    "answer deletion deduction skipped, balance too low"
                );
            }
        }

        let question_id = answer.question_id;
        let txn = self.db.begin().await?;

        Vote::delete_many()
            .filter(vote::Column::TargetType.eq("answer"))
            .filter(vote::Column::TargetId.eq(answer_id))
            .exec(&txn)
            .await?;

        Answer::delete_by_id(answer_id).exec(&txn).await?;

        Question::update_many()
            .col_expr(
                question::Column::AnswerCount,
                Expr::cust("GREATEST(answer_count - 1, 0)"),
            )
            .filter(question::Column::Id.eq(question_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_answer_deletion_costs_the_submission_reward() {
        assert_eq!(deletion_deduction(0), 5);
        assert_eq!(deletion_deduction(4), 5);
    }

    #[test]
    fn milestone_answer_deletion_also_reverses_the_bonus() {
        assert_eq!(deletion_deduction(5), 10);
        assert_eq!(deletion_deduction(12), 10);
    }
}

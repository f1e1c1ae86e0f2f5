use crate::{
    error::AppResult,
    models::{
        daily_post_limit, daily_question_limit, DailyPostLimit, DailyPostLimitModel,
        DailyQuestionLimit, DailyQuestionLimitModel,
    },
};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Sentinel plan value treated as "no practical limit".
pub const UNLIMITED: i32 = 999;

/// Daily post allowance as a function of the accepted friend count.
pub fn post_quota(friend_count: u64) -> i32 {
    match friend_count {
        0 => 0,
        1 => 1,
        2 => 2,
        n if n >= 10 => UNLIMITED,
        _ => 1, // 3-9 friends
    }
}

/// `count < max` — the single gate every limited action runs through.
pub fn can_act(count: i32, max: i32) -> bool {
    count < max
}

/// The service's definition of "today". Counters key on the UTC calendar
/// date and lapse naturally when it rolls over.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub struct DailyLimitService {
    db: DatabaseConnection,
}

impl DailyLimitService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch or create the post counter for (user, date). The stored max is
    /// always overwritten with `current_max` — limits follow the user's
    /// live friend count, never the value at row creation.
    pub async fn get_or_init_post(
        &self,
        user_id: i32,
        date: NaiveDate,
        current_max: i32,
    ) -> AppResult<DailyPostLimitModel> {
        let existing = DailyPostLimit::find()
            .filter(daily_post_limit::Column::UserId.eq(user_id))
            .filter(daily_post_limit::Column::Date.eq(date))
            .one(&self.db)
            .await?;

        match existing {
            Some(row) if row.max_posts == current_max => Ok(row),
            Some(row) => {
                let mut active: daily_post_limit::ActiveModel = row.into();
                active.max_posts = Set(current_max);
                Ok(active.update(&self.db).await?)
            }
            None => {
                let fresh = daily_post_limit::ActiveModel {
                    user_id: Set(user_id),
                    date: Set(date),
                    post_count: Set(0),
                    max_posts: Set(current_max),
                    ..Default::default()
                };
                Ok(fresh.insert(&self.db).await?)
            }
        }
    }

    /// Bump the post count for an existing row. Callers run
    /// `get_or_init_post` first; a missing row is left missing.
    pub async fn increment_post(&self, user_id: i32, date: NaiveDate) -> AppResult<()> {
        DailyPostLimit::update_many()
            .col_expr(
                daily_post_limit::Column::PostCount,
                Expr::col(daily_post_limit::Column::PostCount).add(1),
            )
            .filter(daily_post_limit::Column::UserId.eq(user_id))
            .filter(daily_post_limit::Column::Date.eq(date))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_or_init_question(
        &self,
        user_id: i32,
        date: NaiveDate,
        current_max: i32,
    ) -> AppResult<DailyQuestionLimitModel> {
        let existing = DailyQuestionLimit::find()
            .filter(daily_question_limit::Column::UserId.eq(user_id))
            .filter(daily_question_limit::Column::Date.eq(date))
            .one(&self.db)
            .await?;

        match existing {
            Some(row) if row.max_questions == current_max => Ok(row),
            Some(row) => {
                let mut active: daily_question_limit::ActiveModel = row.into();
                active.max_questions = Set(current_max);
                Ok(active.update(&self.db).await?)
            }
            None => {
                let fresh = daily_question_limit::ActiveModel {
                    user_id: Set(user_id),
                    date: Set(date),
                    question_count: Set(0),
                    max_questions: Set(current_max),
                    ..Default::default()
                };
                Ok(fresh.insert(&self.db).await?)
            }
        }
    }

    pub async fn increment_question(&self, user_id: i32, date: NaiveDate) -> AppResult<()> {
        DailyQuestionLimit::update_many()
            .col_expr(
                daily_question_limit::Column::QuestionCount,
                Expr::col(daily_question_limit::Column::QuestionCount).add(1),
            )
            .filter(daily_question_limit::Column::UserId.eq(user_id))
            .filter(daily_question_limit::Column::Date.eq(date))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

use crate::{
    error::{AppError, AppResult},
    models::{reward, reward_badge, user, Reward, RewardBadge, RewardModel, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// A sender must hold at least this balance before any transfer is allowed,
/// independent of the amount being sent.
pub const MIN_TRANSFER_BALANCE: i32 = 10;

/// Points granted for submitting an answer, and for the upvote milestone.
pub const ANSWER_REWARD: i32 = 5;
pub const MILESTONE_BONUS: i32 = 5;
pub const MILESTONE_UPVOTES: i32 = 5;

/// Can `points` leave an account holding `balance`?
pub fn transfer_allowed(balance: i32, points: i32) -> bool {
    balance >= MIN_TRANSFER_BALANCE && balance >= points
}

pub struct RewardService {
    db: DatabaseConnection,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntry {
    pub user_id: i32,
    pub name: String,
    pub total_points_earned: i32,
}

impl RewardService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a user's account, creating an empty one on first touch.
    pub async fn get_or_create(&self, user_id: i32) -> AppResult<RewardModel> {
        self.get_or_create_on(&self.db, user_id).await
    }

    async fn get_or_create_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
    ) -> AppResult<RewardModel> {
        if let Some(existing) = Reward::find()
            .filter(reward::Column::UserId.eq(user_id))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let now = chrono::Utc::now().naive_utc();
        let fresh = reward::ActiveModel {
            user_id: Set(user_id),
            points: Set(0),
            total_points_earned: Set(0),
            total_points_spent: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(fresh.insert(conn).await?)
    }

    /// Credit `points` to a user, creating the account if needed, and
    /// optionally award a badge. Zero points leaves the balance untouched.
    pub async fn grant(
        &self,
        user_id: i32,
        points: i32,
        badge: Option<&str>,
    ) -> AppResult<RewardModel> {
        let account = self.get_or_create(user_id).await?;
        let account_id = account.id;
        let now = chrono::Utc::now().naive_utc();

        let account = if points != 0 {
            let new_points = account.points + points;
            let new_earned = account.total_points_earned + points;
            let mut active: reward::ActiveModel = account.into();
            active.points = Set(new_points);
            active.total_points_earned = Set(new_earned);
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            account
        };

        if let Some(name) = badge {
            let badge_row = reward_badge::ActiveModel {
                reward_id: Set(account_id),
                name: Set(name.to_string()),
                earned_at: Set(now),
                ..Default::default()
            };
            badge_row.insert(&self.db).await?;
        }

        Ok(account)
    }

    /// Spend `points` if the balance covers them. Insufficient balance is a
    /// silent no-op returning false, not an error.
    pub async fn deduct(&self, user_id: i32, points: i32) -> AppResult<bool> {
        let account = Reward::find()
            .filter(reward::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(account) = account else {
            return Ok(false);
        };
        if account.points < points {
            return Ok(false);
        }

        let new_points = account.points - points;
        let new_spent = account.total_points_spent + points;
        let mut active: reward::ActiveModel = account.into();
        active.points = Set(new_points);
        active.total_points_spent = Set(new_spent);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(true)
    }

    /// Take one point back from an answer owner for a fresh downvote.
    /// Skipped silently when the owner has no account or an empty balance.
    pub async fn apply_downvote_penalty(&self, user_id: i32) -> AppResult<()> {
        let account = Reward::find()
            .filter(reward::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(account) = account {
            if account.points > 0 {
                let new_points = account.points - 1;
                let new_spent = account.total_points_spent + 1;
                let mut active: reward::ActiveModel = account.into();
                active.points = Set(new_points);
                active.total_points_spent = Set(new_spent);
                active.updated_at = Set(chrono::Utc::now().naive_utc());
                active.update(&self.db).await?;
            }
        }
        Ok(())
    }

    /// Give back the downvote point when the downvote is withdrawn. The
    /// refund touches the balance only — lifetime counters stay put.
    pub async fn refund_downvote(&self, user_id: i32) -> AppResult<()> {
        let account = Reward::find()
            .filter(reward::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(account) = account {
            let new_points = account.points + 1;
            let mut active: reward::ActiveModel = account.into();
            active.points = Set(new_points);
            active.updated_at = Set(chrono::Utc::now().naive_utc());
            active.update(&self.db).await?;
        }
        Ok(())
    }

    /// Move points between two accounts as a single all-or-nothing unit.
    pub async fn transfer(&self, sender_id: i32, recipient_id: i32, points: i32) -> AppResult<()> {
        if sender_id == recipient_id {
            return Err(AppError::Validation(
                "You cannot transfer points to yourself".to_string(),
            ));
        }
        if points <= 0 {
            return Err(AppError::Validation(
                "Points to transfer must be positive".to_string(),
            ));
        }

        User::find_by_id(recipient_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let txn = self.db.begin().await?;

        let sender = Reward::find()
            .filter(reward::Column::UserId.eq(sender_id))
            .one(&txn)
            .await?;

        let Some(sender) = sender else {
            return Err(AppError::InsufficientPoints(
                "Insufficient points to transfer".to_string(),
            ));
        };
        if !transfer_allowed(sender.points, points) {
            return Err(AppError::InsufficientPoints(
                "Insufficient points to transfer".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();

        match Reward::find()
            .filter(reward::Column::UserId.eq(recipient_id))
            .one(&txn)
            .await?
        {
            Some(recipient) => {
                let new_points = recipient.points + points;
                let new_earned = recipient.total_points_earned + points;
                let mut active: reward::ActiveModel = recipient.into();
                active.points = Set(new_points);
                active.total_points_earned = Set(new_earned);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
            None => {
                let fresh = reward::ActiveModel {
                    user_id: Set(recipient_id),
                    points: Set(points),
                    total_points_earned: Set(points),
                    total_points_spent: Set(0),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                fresh.insert(&txn).await?;
            }
        }

        let sender_points = sender.points - points;
        let sender_spent = sender.total_points_spent + points;
        let mut sender_active: reward::ActiveModel = sender.into();
        sender_active.points = Set(sender_points);
        sender_active.total_points_spent = Set(sender_spent);
        sender_active.updated_at = Set(now);
        sender_active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Account plus earned badges, for the status endpoint.
    pub async fn status(&self, user_id: i32) -> AppResult<(RewardModel, Vec<String>)> {
        let account = self.get_or_create(user_id).await?;
        let badges = RewardBadge::find()
            .filter(reward_badge::Column::RewardId.eq(account.id))
            .order_by_asc(reward_badge::Column::EarnedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|b| b.name)
            .collect();
        Ok((account, badges))
    }

    /// Top earners by lifetime points, descending, capped at `limit`.
    pub async fn leaderboard(&self, limit: u64) -> AppResult<Vec<LeaderboardEntry>> {
        let rows = Reward::find()
            .find_also_related(User)
            .order_by_desc(reward::Column::TotalPointsEarned)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(account, user)| LeaderboardEntry {
                user_id: account.user_id,
                name: user.map(|u| u.name).unwrap_or_default(),
                total_points_earned: account.total_points_earned,
            })
            .collect())
    }

    /// Name/email substring search for picking a transfer recipient.
    pub async fn search_users(&self, query: &str, exclude_user: i32) -> AppResult<Vec<UserModel>> {
        let pattern = format!("%{}%", query.trim());
        let users = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Name.like(pattern.as_str()))
                    .add(user::Column::Email.like(pattern.as_str())),
            )
            .filter(user::Column::Id.ne(exclude_user))
            .order_by_asc(user::Column::Name)
            .limit(10)
            .all(&self.db)
            .await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_needs_minimum_balance() {
        // Balance below the floor blocks even tiny transfers.
        assert!(!transfer_allowed(9, 1));
        assert!(!transfer_allowed(0, 0));
    }

    #[test]
    fn transfer_at_floor_is_allowed() {
        assert!(transfer_allowed(10, 10));
        assert!(transfer_allowed(10, 1));
    }

    #[test]
    fn transfer_cannot_exceed_balance() {
        assert!(!transfer_allowed(15, 16));
        assert!(transfer_allowed(15, 15));
    }

    #[test]
    fn transfer_large_balance() {
        assert!(transfer_allowed(1000, 999));
    }
}

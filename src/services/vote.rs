use crate::{
    error::{AppError, AppResult},
    models::{answer, question, vote, Answer, Question, Vote},
    services::reward::{RewardService, MILESTONE_BONUS, MILESTONE_UPVOTES},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Question,
    Answer,
}

impl VoteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteTarget::Question => "question",
            VoteTarget::Answer => "answer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Upvote,
    Downvote,
}

impl VoteDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upvote" => Some(VoteDirection::Upvote),
            "downvote" => Some(VoteDirection::Downvote),
            _ => None,
        }
    }
}

/// A voter's standing relationship to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    None,
    Upvoted,
    Downvoted,
}

impl VoteState {
    fn from_value(value: i16) -> Self {
        match value {
            1 => VoteState::Upvoted,
            -1 => VoteState::Downvoted,
            _ => VoteState::None,
        }
    }

    fn to_value(self) -> i16 {
        match self {
            VoteState::Upvoted => 1,
            VoteState::Downvoted => -1,
            VoteState::None => 0,
        }
    }
}

/// The toggle rules. An upvote clears any standing downvote and then
/// toggles upvote membership; a downvote clears any standing upvote and
/// then toggles downvote membership.
pub fn next_state(current: VoteState, direction: VoteDirection) -> VoteState {
    match direction {
        VoteDirection::Upvote => match current {
            VoteState::Upvoted => VoteState::None,
            _ => VoteState::Upvoted,
        },
        VoteDirection::Downvote => match current {
            VoteState::Downvoted => VoteState::None,
            _ => VoteState::Downvoted,
        },
    }
}

/// Cached-counter adjustments implied by a state change.
pub fn count_deltas(old: VoteState, new: VoteState) -> (i32, i32) {
    let up = |s: VoteState| (s == VoteState::Upvoted) as i32;
    let down = |s: VoteState| (s == VoteState::Downvoted) as i32;
    (up(new) - up(old), down(new) - down(old))
}

/// Point consequence for the target owner (answers only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerPointEffect {
    /// A new downvote landed: -1 if the owner has a positive balance.
    Penalty,
    /// A standing downvote was withdrawn or flipped: +1 unconditionally.
    Refund,
    NoChange,
}

pub fn owner_point_effect(old: VoteState, new: VoteState) -> OwnerPointEffect {
    if old == VoteState::Downvoted && new != VoteState::Downvoted {
        OwnerPointEffect::Refund
    } else if old != VoteState::Downvoted && new == VoteState::Downvoted {
        OwnerPointEffect::Penalty
    } else {
        OwnerPointEffect::NoChange
    }
}

/// Did this mutation push the upvote count from below the milestone to
/// exactly on it? Deliberately re-arms after a 5 -> 4 -> 5 swing.
pub fn crossed_milestone(previous_upvotes: i32, new_upvotes: i32) -> bool {
    previous_upvotes < MILESTONE_UPVOTES && new_upvotes == MILESTONE_UPVOTES
}

#[derive(Debug, Clone, Copy)]
pub struct VoteOutcome {
    pub state: VoteState,
    pub upvotes: i32,
    pub downvotes: i32,
    pub milestone_awarded: bool,
}

pub struct VoteService {
    db: DatabaseConnection,
}

impl VoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Apply one vote call: mutate the vote row and the cached counters in
    /// a transaction, then settle the owner's points. Point settlement sits
    /// outside the transaction — a concurrent double-submission races
    /// last-write-wins, which is the accepted consistency level here.
    pub async fn vote(
        &self,
        voter_id: i32,
        target: VoteTarget,
        target_id: i32,
        direction: VoteDirection,
    ) -> AppResult<VoteOutcome> {
        let (owner_id, previous_upvotes, previous_downvotes) = match target {
            VoteTarget::Question => {
                let q = Question::find_by_id(target_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| AppError::NotFound("question not found".to_string()))?;
                (q.user_id, q.upvotes, q.downvotes)
            }
            VoteTarget::Answer => {
                let a = Answer::find_by_id(target_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| AppError::NotFound("answer not found".to_string()))?;
                (a.user_id, a.upvotes, a.downvotes)
            }
        };

        let txn = self.db.begin().await?;

        let existing = Vote::find()
            .filter(vote::Column::UserId.eq(voter_id))
            .filter(vote::Column::TargetType.eq(target.as_str()))
            .filter(vote::Column::TargetId.eq(target_id))
            .one(&txn)
            .await?;

        let old_state = existing
            .as_ref()
            .map(|v| VoteState::from_value(v.value))
            .unwrap_or(VoteState::None);
        let new_state = next_state(old_state, direction);

        match (existing, new_state) {
            (Some(row), VoteState::None) => {
                Vote::delete_by_id(row.id).exec(&txn).await?;
            }
            (Some(row), state) => {
                let mut active: vote::ActiveModel = row.into();
                active.value = Set(state.to_value());
                active.update(&txn).await?;
            }
            (None, VoteState::None) => {}
            (None, state) => {
                let row = vote::ActiveModel {
                    user_id: Set(voter_id),
                    target_type: Set(target.as_str().to_string()),
                    target_id: Set(target_id),
                    value: Set(state.to_value()),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                };
                row.insert(&txn).await?;
            }
        }

        let (delta_up, delta_down) = count_deltas(old_state, new_state);
        self.apply_counter_delta(&txn, target, target_id, delta_up, delta_down)
            .await?;

        txn.commit().await?;

        let upvotes = previous_upvotes + delta_up;
        let downvotes = previous_downvotes + delta_down;

        // Point settlement, answers only.
        let mut milestone_awarded = false;
        if target == VoteTarget::Answer {
            if let Some(owner_id) = owner_id {
                let rewards = RewardService::new(self.db.clone());
                match owner_point_effect(old_state, new_state) {
                    OwnerPointEffect::Penalty => rewards.apply_downvote_penalty(owner_id).await?,
                    OwnerPointEffect::Refund => rewards.refund_downvote(owner_id).await?,
                    OwnerPointEffect::NoChange => {}
                }

                if crossed_milestone(previous_upvotes, upvotes) {
                    rewards.grant(owner_id, MILESTONE_BONUS, None).await?;
                    milestone_awarded = true;
                }
            }
        }

        Ok(VoteOutcome {
            state: new_state,
            upvotes,
            downvotes,
            milestone_awarded,
        })
    }

    async fn apply_counter_delta<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: VoteTarget,
        target_id: i32,
        delta_up: i32,
        delta_down: i32,
    ) -> AppResult<()> {
        if delta_up == 0 && delta_down == 0 {
            return Ok(());
        }

        match target {
            VoteTarget::Question => {
                Question::update_many()
                    .col_expr(
                        question::Column::Upvotes,
                        Expr::col(question::Column::Upvotes).add(delta_up),
                    )
                    .col_expr(
                        question::Column::Downvotes,
                        Expr::col(question::Column::Downvotes).add(delta_down),
                    )
                    .filter(question::Column::Id.eq(target_id))
                    .exec(conn)
                    .await?;
            }
            VoteTarget::Answer => {
                Answer::update_many()
                    .col_expr(
                        answer::Column::Upvotes,
                        Expr::col(answer::Column::Upvotes).add(delta_up),
                    )
                    .col_expr(
                        answer::Column::Downvotes,
                        Expr::col(answer::Column::Downvotes).add(delta_down),
                    )
                    .filter(answer::Column::Id.eq(target_id))
                    .exec(conn)
                    .await?;
            }
        }
        Ok(())
    }
}

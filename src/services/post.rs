use crate::{
    error::{AppError, AppResult},
    models::{
        friendship, post, post_comment, post_like, post_share, Friendship, Post, PostComment,
        PostCommentModel, PostLike, PostModel, PostShare, User,
    },
    services::daily_limit::{can_act, post_quota, today, DailyLimitService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MediaItem {
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: PostModel,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyPostStatus {
    pub post_count: i32,
    pub max_posts: i32,
    pub remaining_posts: i32,
    pub can_post: bool,
    pub friend_count: u64,
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Accepted friendships touching the user, from either side.
    pub async fn accepted_friend_count(&self, user_id: i32) -> AppResult<u64> {
        let count = Friendship::find()
            .filter(friendship::Column::Status.eq("accepted"))
            .filter(
                Condition::any()
                    .add(friendship::Column::RequesterId.eq(user_id))
                    .add(friendship::Column::RecipientId.eq(user_id)),
            )
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Publish a post. Friendless users are locked out entirely; everyone
    /// else spends one unit of a daily allowance derived live from their
    /// friend count.
    pub async fn create(
        &self,
        user_id: i32,
        content: &str,
        media: &[MediaItem],
    ) -> AppResult<(PostModel, i32)> {
        let content = content.trim();
        if content.is_empty() || content.len() > 1000 {
            return Err(AppError::Validation(
                "Post content must be between 1 and 1000 characters".to_string(),
            ));
        }

        let friend_count = self.accepted_friend_count(user_id).await?;
        if friend_count == 0 {
            return Err(AppError::Forbidden(
                "You need at least 1 friend to post. Add some friends first!".to_string(),
            ));
        }

        let limits = DailyLimitService::new(self.db.clone());
        let date = today();
        let counter = limits
            .get_or_init_post(user_id, date, post_quota(friend_count))
            .await?;

        if !can_act(counter.post_count, counter.max_posts) {
            return Err(AppError::RateLimited(format!(
                "You have reached your daily post limit of {} posts. Come back tomorrow!",
                counter.max_posts
            )));
        }

        let row = post::ActiveModel {
            user_id: Set(user_id),
            content: Set(content.to_string()),
            media: Set(serde_json::to_value(media)
                .map_err(|e| AppError::Internal(e.into()))?),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        let created = row.insert(&self.db).await?;

        limits.increment_post(user_id, date).await?;

        let remaining = (counter.max_posts - counter.post_count - 1).max(0);
        Ok((created, remaining))
    }

    /// Public feed, newest first, with author info and engagement counts.
    pub async fn feed(&self, page: u64, per_page: u64) -> AppResult<(Vec<FeedPost>, u64)> {
        let paginator = Post::find()
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;

        let user_ids: Vec<i32> = posts.iter().map(|p| p.user_id).collect();
        let authors: HashMap<i32, (String, String)> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            User::find()
                .filter(crate::models::user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, (u.name, u.email)))
                .collect()
        };

        let mut feed = Vec::with_capacity(posts.len());
        for p in posts {
            let likes = PostLike::find()
                .filter(post_like::Column::PostId.eq(p.id))
                .count(&self.db)
                .await?;
            let comments = PostComment::find()
                .filter(post_comment::Column::PostId.eq(p.id))
                .count(&self.db)
                .await?;
            let shares = PostShare::find()
                .filter(post_share::Column::PostId.eq(p.id))
                .count(&self.db)
                .await?;

            let author = authors.get(&p.user_id);
            feed.push(FeedPost {
                author_name: author.map(|(name, _)| name.clone()),
                author_email: author.map(|(_, email)| email.clone()),
                likes,
                comments,
                shares,
                post: p,
            });
        }

        Ok((feed, total))
    }

    async fn require_post(&self, post_id: i32) -> AppResult<PostModel> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Toggle a like. Returns (now_liked, like_count).
    pub async fn like(&self, post_id: i32, user_id: i32) -> AppResult<(bool, u64)> {
        self.require_post(post_id).await?;

        let existing = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let now_liked = match existing {
            Some(like) => {
                PostLike::delete_by_id(like.id).exec(&self.db).await?;
                false
            }
            None => {
                let row = post_like::ActiveModel {
                    post_id: Set(post_id),
                    user_id: Set(user_id),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                };
                row.insert(&self.db).await?;
                true
            }
        };

        let count = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;
        Ok((now_liked, count))
    }

    /// Add a comment. Returns (comment, total_comments).
    pub async fn comment(
        &self,
        post_id: i32,
        user_id: i32,
        content: &str,
    ) -> AppResult<(PostCommentModel, u64)> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment content is required".to_string(),
            ));
        }

        self.require_post(post_id).await?;

        let row = post_comment::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        let created = row.insert(&self.db).await?;

        let total = PostComment::find()
            .filter(post_comment::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;
        Ok((created, total))
    }

    /// Share a post, once per user. Returns the share count.
    pub async fn share(&self, post_id: i32, user_id: i32) -> AppResult<u64> {
        self.require_post(post_id).await?;

        let existing = PostShare::find()
            .filter(post_share::Column::PostId.eq(post_id))
            .filter(post_share::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "You already shared this post".to_string(),
            ));
        }

        let row = post_share::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        row.insert(&self.db).await?;

        let count = PostShare::find()
            .filter(post_share::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Today's posting status. The max is always re-derived from the live
    /// friend count — a mid-day friend change moves it immediately.
    pub async fn daily_status(&self, user_id: i32) -> AppResult<DailyPostStatus> {
        let friend_count = self.accepted_friend_count(user_id).await?;
        let max_posts = post_quota(friend_count);

        let limits = DailyLimitService::new(self.db.clone());
        let counter = limits.get_or_init_post(user_id, today(), max_posts).await?;

        Ok(DailyPostStatus {
            post_count: counter.post_count,
            max_posts: counter.max_posts,
            remaining_posts: (counter.max_posts - counter.post_count).max(0),
            can_post: can_act(counter.post_count, counter.max_posts) && friend_count > 0,
            friend_count,
        })
    }
}

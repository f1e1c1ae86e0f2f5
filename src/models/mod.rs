pub mod answer;
pub mod daily_post_limit;
pub mod daily_question_limit;
pub mod friendship;
pub mod login_history;
pub mod login_otp;
pub mod password_reset;
pub mod post;
pub mod post_comment;
pub mod post_like;
pub mod post_share;
pub mod question;
pub mod reward;
pub mod reward_badge;
pub mod subscription_plan;
pub mod user;
pub mod user_language;
pub mod user_subscription;
pub mod vote;

pub use answer::{Entity as Answer, Model as AnswerModel};
pub use daily_post_limit::{Entity as DailyPostLimit, Model as DailyPostLimitModel};
pub use daily_question_limit::{Entity as DailyQuestionLimit, Model as DailyQuestionLimitModel};
pub use friendship::Entity as Friendship;
pub use login_history::{Entity as LoginHistory, Model as LoginHistoryModel};
pub use login_otp::{Entity as LoginOtp, Model as LoginOtpModel};
pub use password_reset::{Entity as PasswordReset, Model as PasswordResetModel};
pub use post::{Entity as Post, Model as PostModel};
pub use post_comment::{Entity as PostComment, Model as PostCommentModel};
pub use post_like::Entity as PostLike;
pub use post_share::Entity as PostShare;
pub use question::{Entity as Question, Model as QuestionModel};
pub use reward::{Entity as Reward, Model as RewardModel};
pub use reward_badge::{Entity as RewardBadge, Model as RewardBadgeModel};
pub use subscription_plan::{Entity as SubscriptionPlan, Model as SubscriptionPlanModel};
pub use user::{Entity as User, Model as UserModel};
pub use user_language::{Entity as UserLanguage, Model as UserLanguageModel};
pub use user_subscription::{Entity as UserSubscription, Model as UserSubscriptionModel};
pub use vote::{Entity as Vote, Model as VoteModel};

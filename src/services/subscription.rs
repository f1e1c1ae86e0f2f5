use crate::{
    config::access::AccessConfig,
    error::{AppError, AppResult},
    models::{
        subscription_plan, user_subscription, SubscriptionPlan, SubscriptionPlanModel, User,
        UserSubscription, UserSubscriptionModel,
    },
    services::{
        daily_limit::{can_act, today, DailyLimitService},
        email::EmailService,
        payment::{PaymentProvider, PaymentService},
    },
    utils::time_window::is_within_window,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

pub const FREE_PLAN: &str = "Free";

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct CanPostStatus {
    pub can_post: bool,
    pub current_count: i32,
    pub max_questions: i32,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct PaymentDetails {
    pub provider: String,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub amount: i32,
    pub currency: String,
    pub subscription_id: i32,
}

pub struct SubscriptionService {
    db: DatabaseConnection,
    access: AccessConfig,
}

impl SubscriptionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            access: AccessConfig::from_env(),
        }
    }

    /// Active plan catalog, cheapest first.
    pub async fn plans(&self) -> AppResult<Vec<SubscriptionPlanModel>> {
        Ok(SubscriptionPlan::find()
            .filter(subscription_plan::Column::IsActive.eq(true))
            .order_by_asc(subscription_plan::Column::Price)
            .all(&self.db)
            .await?)
    }

    /// The user's live subscription: status `active` and not yet past its
    /// end date. A cancelled-but-unexpired row does not qualify.
    pub async fn active_with_plan(
        &self,
        user_id: i32,
    ) -> AppResult<Option<(UserSubscriptionModel, SubscriptionPlanModel)>> {
        let now = chrono::Utc::now().naive_utc();
        let found = UserSubscription::find()
            .filter(user_subscription::Column::UserId.eq(user_id))
            .filter(user_subscription::Column::Status.eq("active"))
            .filter(user_subscription::Column::EndDate.gt(now))
            .find_also_related(SubscriptionPlan)
            .one(&self.db)
            .await?;

        Ok(match found {
            Some((sub, Some(plan))) => Some((sub, plan)),
            _ => None,
        })
    }

    /// (plan name, daily question allowance) for the user: the active plan
    /// if any, else the Free plan. None when the Free plan is missing from
    /// the catalog.
    pub async fn question_quota(&self, user_id: i32) -> AppResult<Option<(String, i32)>> {
        if let Some((_, plan)) = self.active_with_plan(user_id).await? {
            return Ok(Some((plan.name, plan.max_questions_per_day)));
        }

        let free = SubscriptionPlan::find()
            .filter(subscription_plan::Column::Name.eq(FREE_PLAN))
            .one(&self.db)
            .await?;
        Ok(free.map(|p| (p.name, p.max_questions_per_day)))
    }

    /// Live posting status against today's counter. The counter's max is
    /// re-derived from the current plan on every call.
    pub async fn can_post_question(&self, user_id: i32) -> AppResult<CanPostStatus> {
        let Some((plan, max)) = self.question_quota(user_id).await? else {
            return Ok(CanPostStatus {
                can_post: false,
                current_count: 0,
                max_questions: 0,
                plan: FREE_PLAN.to_string(),
                message: Some("Free plan not configured".to_string()),
            });
        };

        let limits = DailyLimitService::new(self.db.clone());
        let counter = limits.get_or_init_question(user_id, today(), max).await?;

        Ok(CanPostStatus {
            can_post: can_act(counter.question_count, counter.max_questions),
            current_count: counter.question_count,
            max_questions: counter.max_questions,
            plan,
            message: None,
        })
    }

    /// Start a subscription purchase: gated by the daily payment window,
    /// one pending-or-active subscription per user.
    pub async fn create_payment(
        &self,
        user_id: i32,
        plan_id: i32,
        provider: &str,
        payment: &PaymentService,
    ) -> AppResult<PaymentDetails> {
        let within_window = is_within_window(
            chrono::Utc::now(),
            self.access.tz_offset_minutes,
            self.access.payment_start,
            self.access.payment_end,
        );
        if !within_window {
            return Err(AppError::Forbidden(
                "Payments are only allowed between 10 AM and 11 AM IST".to_string(),
            ));
        }

        let provider = PaymentProvider::parse(provider)
            .ok_or_else(|| AppError::Validation("Invalid payment provider".to_string()))?;

        let plan = SubscriptionPlan::find_by_id(plan_id)
            .one(&self.db)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::Validation("Invalid or inactive subscription plan".to_string())
            })?;

        let now = chrono::Utc::now().naive_utc();
        let blocking = UserSubscription::find()
            .filter(user_subscription::Column::UserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(user_subscription::Column::Status.eq("pending"))
                    .add(
                        Condition::all()
                            .add(user_subscription::Column::Status.eq("active"))
                            .add(user_subscription::Column::EndDate.gt(now)),
                    ),
            )
            .one(&self.db)
            .await?;
        if blocking.is_some() {
            return Err(AppError::Conflict(
                "You already have an active or pending subscription".to_string(),
            ));
        }

        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let receipt = format!("sub_{}_{}", user_id, now.and_utc().timestamp());
        let order = payment
            .create_order(provider, plan.price, &plan.currency, &receipt)
            .await?;

        let end_date = now
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("end date overflow")))?;

        let row = user_subscription::ActiveModel {
            user_id: Set(user_id),
            plan_id: Set(plan.id),
            status: Set("pending".to_string()),
            start_date: Set(now),
            end_date: Set(end_date),
            payment_id: Set(order.payment_id.clone()),
            payment_provider: Set(provider.as_str().to_string()),
            payment_amount: Set(plan.price),
            payment_currency: Set(plan.currency.clone()),
            payment_status: Set("pending".to_string()),
            auto_renew: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let subscription = row.insert(&self.db).await?;

        Ok(PaymentDetails {
            provider: provider.as_str().to_string(),
            payment_id: order.payment_id,
            client_secret: order.client_secret,
            amount: plan.price,
            currency: plan.currency,
            subscription_id: subscription.id,
        })
    }

    /// Settle a pending subscription against the provider's verdict. The
    /// state transition commits first; the confirmation email follows and
    /// never rolls it back.
    pub async fn verify_payment(
        &self,
        subscription_id: i32,
        payment_id: &str,
        reported_status: &str,
        payment: &PaymentService,
        email_service: &EmailService,
    ) -> AppResult<UserSubscriptionModel> {
        let (subscription, plan) = UserSubscription::find_by_id(subscription_id)
            .find_also_related(SubscriptionPlan)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
        let plan =
            plan.ok_or_else(|| AppError::Internal(anyhow::anyhow!("subscription has no plan")))?;

        if subscription.status != "pending" {
            return Err(AppError::Conflict(
                "Subscription is not awaiting payment verification".to_string(),
            ));
        }

        let provider = PaymentProvider::parse(&subscription.payment_provider)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown stored provider")))?;

        let valid = payment_id == subscription.payment_id
            && payment.verify(provider, payment_id, reported_status);

        let now = chrono::Utc::now().naive_utc();
        let user_id = subscription.user_id;

        if !valid {
            let txn = self.db.begin().await?;
            let mut active: user_subscription::ActiveModel = subscription.into();
            active.status = Set("cancelled".to_string());
            active.payment_status = Set("failed".to_string());
            active.updated_at = Set(now);
            active.update(&txn).await?;
            txn.commit().await?;

            return Err(AppError::Validation(
                "Payment verification failed".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let mut active: user_subscription::ActiveModel = subscription.into();
        active.status = Set("active".to_string());
        active.payment_status = Set("completed".to_string());
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        // Confirmation email is best-effort; the activation stands.
        if let Ok(Some(user)) = User::find_by_id(user_id).one(&self.db).await {
            if let Err(e) = email_service
                .send_subscription_confirmation(
                    &user.email,
                    &user.name,
                    &plan.name,
                    plan.price,
                    plan.max_questions_per_day,
                )
                .await
            {
                tracing::warn!("Failed to send subscription confirmation email: {e}");
            }
        }

        Ok(updated)
    }

    /// Cancel an active subscription. Access runs to the original end date
    /// on paper, but the plan lookup requires status `active`, so the plan
    /// benefits stop immediately.
    pub async fn cancel(&self, user_id: i32) -> AppResult<UserSubscriptionModel> {
        let now = chrono::Utc::now().naive_utc();
        let subscription = UserSubscription::find()
            .filter(user_subscription::Column::UserId.eq(user_id))
            .filter(user_subscription::Column::Status.eq("active"))
            .filter(user_subscription::Column::EndDate.gt(now))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("No active subscription found".to_string()))?;

        let mut active: user_subscription::ActiveModel = subscription.into();
        active.status = Set("cancelled".to_string());
        active.auto_renew = Set(false);
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }
}

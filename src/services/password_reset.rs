use crate::{
    error::{AppError, AppResult},
    models::{password_reset, user, PasswordReset, PasswordResetModel, User},
    services::{email::EmailService, sms::SmsService},
    utils::{
        hash_password,
        otp::{generate_password, generate_reset_token},
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
pub const MAX_RESET_ATTEMPTS: i32 = 3;
pub const MAX_REQUESTS_PER_DAY: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetChannel {
    Email,
    Phone,
}

impl ResetChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetChannel::Email => "email",
            ResetChannel::Phone => "phone",
        }
    }
}

pub struct PasswordResetService {
    db: DatabaseConnection,
}

impl PasswordResetService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issue a reset token for the account matching `email` or `phone` and
    /// send it over the matching channel. One request per user per
    /// calendar day.
    pub async fn request_reset(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        email_service: &EmailService,
        sms_service: &SmsService,
    ) -> AppResult<String> {
        let (account, channel, reset_value) = match (email, phone) {
            (Some(email), _) => {
                let found = User::find()
                    .filter(user::Column::Email.eq(email))
                    .one(&self.db)
                    .await?;
                (found, ResetChannel::Email, email.to_string())
            }
            (None, Some(phone)) => {
                let found = User::find()
                    .filter(user::Column::Phone.eq(phone))
                    .one(&self.db)
                    .await?;
                (found, ResetChannel::Phone, phone.to_string())
            }
            (None, None) => {
                return Err(AppError::Validation(
                    "Please provide either email or phone number".to_string(),
                ));
            }
        };

        let account = account.ok_or_else(|| {
            AppError::NotFound("User not found with the provided email/phone".to_string())
        })?;

        if self.requests_today(account.id).await? >= MAX_REQUESTS_PER_DAY {
            return Err(AppError::RateLimited(
                "You can only request a password reset once per day. Please try again tomorrow."
                    .to_string(),
            ));
        }

        let token = generate_reset_token()?;
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::hours(RESET_TOKEN_TTL_HOURS);

        let row = password_reset::ActiveModel {
            user_id: Set(account.id),
            reset_token: Set(token.clone()),
            reset_type: Set(channel.as_str().to_string()),
            reset_value: Set(reset_value),
            used: Set(false),
            attempts: Set(0),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        };
        row.insert(&self.db).await?;

        // Delivery failure degrades: the token is already persisted and
        // verify-token still works.
        let send_result = match channel {
            ResetChannel::Email => {
                email_service
                    .send_password_reset(&account.email, &account.name, &token)
                    .await
            }
            ResetChannel::Phone => match &account.phone {
                Some(phone) => {
                    sms_service
                        .send_password_reset(phone, &account.name, &token)
                        .await
                }
                None => Ok(()),
            },
        };
        if let Err(e) = send_result {
            tracing::warn!("Failed to deliver password reset token: {e}");
        }

        Ok(channel.as_str().to_string())
    }

    async fn requests_today(&self, user_id: i32) -> AppResult<u64> {
        use sea_orm::PaginatorTrait;

        let today = chrono::Utc::now().date_naive();
        let start = today.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let end = start + chrono::Duration::days(1);

        let count = PasswordReset::find()
            .filter(password_reset::Column::UserId.eq(user_id))
            .filter(password_reset::Column::CreatedAt.gte(start))
            .filter(password_reset::Column::CreatedAt.lt(end))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Consume a token: generate a fresh password, store its hash, flip
    /// the token to used, and send the new password over the original
    /// channel. Each attempt on a token counts toward its cap of 3.
    pub async fn reset_password(
        &self,
        token: &str,
        email_service: &EmailService,
        sms_service: &SmsService,
    ) -> AppResult<()> {
        let reset = self.find_valid(token).await?;

        if reset.attempts >= MAX_RESET_ATTEMPTS {
            return Err(AppError::RateLimited(
                "Maximum attempts exceeded for this reset token".to_string(),
            ));
        }

        let mut counting: password_reset::ActiveModel = reset.clone().into();
        counting.attempts = Set(reset.attempts + 1);
        counting.update(&self.db).await?;

        let account = User::find_by_id(reset.user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let new_password = generate_password()?;
        let new_hash = hash_password(&new_password)?;

        let mut user_active: user::ActiveModel = account.clone().into();
        user_active.password_hash = Set(new_hash);
        user_active.update(&self.db).await?;

        let mut reset_active: password_reset::ActiveModel =
            self.find_by_token(token).await?.into();
        reset_active.used = Set(true);
        reset_active.update(&self.db).await?;

        let send_result = match reset.reset_type.as_str() {
            "phone" => match &account.phone {
                Some(phone) => {
                    sms_service
                        .send_new_password(phone, &account.name, &new_password)
                        .await
                }
                None => Ok(()),
            },
            _ => {
                email_service
                    .send_new_password(&account.email, &account.name, &new_password)
                    .await
            }
        };
        if let Err(e) = send_result {
            tracing::warn!("Failed to deliver new password: {e}");
        }

        Ok(())
    }

    /// Check a token without consuming it. Returns (reset_type, reset_value).
    pub async fn verify_token(&self, token: &str) -> AppResult<(String, String)> {
        let reset = self.find_valid(token).await?;
        Ok((reset.reset_type, reset.reset_value))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<PasswordResetModel> {
        PasswordReset::find()
            .filter(password_reset::Column::ResetToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))
    }

    /// A token is valid while it is unused and unexpired. Used and expired
    /// tokens are indistinguishable from unknown ones.
    async fn find_valid(&self, token: &str) -> AppResult<PasswordResetModel> {
        let reset = self.find_by_token(token).await?;

        let now = chrono::Utc::now().naive_utc();
        if reset.used || now > reset.expires_at {
            return Err(AppError::Validation(
                "Invalid or expired reset token".to_string(),
            ));
        }
        Ok(reset)
    }
}

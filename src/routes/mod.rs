use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Identity and recovery routes: no session required.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/user/signup", routing::post(handlers::signup))
        .route("/user/login", routing::post(handlers::login))
        .route(
            "/user/verify-login-otp",
            routing::post(handlers::verify_login_otp),
        )
        .route(
            "/password-reset/request-reset",
            routing::post(handlers::password_reset::request_reset),
        )
        .route(
            "/password-reset/reset-password",
            routing::post(handlers::password_reset::reset_password),
        )
        .route(
            "/password-reset/verify-token/{reset_token}",
            routing::get(handlers::password_reset::verify_token),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public reads.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/user/getallusers",
            routing::get(handlers::user::get_all_users),
        )
        .route(
            "/question/getallquestion",
            routing::get(handlers::question::get_all_questions),
        )
        .route(
            "/reward/leaderboard",
            routing::get(handlers::reward::leaderboard),
        )
        .route(
            "/subscription/plans",
            routing::get(handlers::subscription::get_plans),
        )
        .route("/posts/feed", routing::get(handlers::post::get_feed));

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Authenticated routes.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Profile
        .route(
            "/user/update/{id}",
            routing::patch(handlers::user::update_profile),
        )
        // Questions
        .route(
            "/question/ask",
            routing::post(handlers::question::ask_question),
        )
        .route(
            "/question/{id}",
            routing::delete(handlers::question::delete_question),
        )
        .route(
            "/question/vote/{id}",
            routing::patch(handlers::question::vote_question),
        )
        // Answers
        .route(
            "/answer/postanswer/{id}",
            routing::post(handlers::answer::post_answer),
        )
        .route(
            "/answer/delete/{id}",
            routing::delete(handlers::answer::delete_answer),
        )
        .route(
            "/answer/vote/{id}",
            routing::patch(handlers::answer::vote_answer),
        )
        // Rewards
        .route(
            "/reward/status",
            routing::get(handlers::reward::reward_status),
        )
        .route(
            "/reward/transfer",
            routing::post(handlers::reward::transfer_points),
        )
        .route(
            "/reward/search-users",
            routing::get(handlers::reward::search_users),
        )
        // Subscriptions
        .route(
            "/subscription/user-subscription",
            routing::get(handlers::subscription::get_user_subscription),
        )
        .route(
            "/subscription/can-post-question",
            routing::get(handlers::subscription::can_post_question),
        )
        .route(
            "/subscription/create-payment",
            routing::post(handlers::subscription::create_payment),
        )
        .route(
            "/subscription/verify-payment",
            routing::post(handlers::subscription::verify_payment),
        )
        .route(
            "/subscription/cancel",
            routing::post(handlers::subscription::cancel_subscription),
        )
        // Language
        .route("/language", routing::get(handlers::language::get_language))
        .route(
            "/language/request-change",
            routing::post(handlers::language::request_change),
        )
        .route(
            "/language/verify-change",
            routing::post(handlers::language::verify_change),
        )
        // Login history
        .route(
            "/login-history",
            routing::get(handlers::login_history::get_login_history),
        )
        // Social feed
        .route("/posts/create", routing::post(handlers::post::create_post))
        .route(
            "/posts/daily-status",
            routing::get(handlers::post::daily_status),
        )
        .route(
            "/posts/{post_id}/like",
            routing::post(handlers::post::like_post),
        )
        .route(
            "/posts/{post_id}/comment",
            routing::post(handlers::post::comment_on_post),
        )
        .route(
            "/posts/{post_id}/share",
            routing::post(handlers::post::share_post),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}

#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Once, OnceLock,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
// Tests in one binary share the database; serialize them so one test's
// table cleanup cannot race another's assertions.
static TEST_LOCK: OnceLock<Arc<tokio::sync::Mutex<()>>> = OnceLock::new();

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Keep time-window gates open so lifecycle tests are deterministic
        std::env::set_var("ACCESS_TZ_OFFSET_MINUTES", "0");
        std::env::set_var("PAYMENT_WINDOW", "00:00-23:59");
        std::env::set_var("MOBILE_LOGIN_WINDOW", "00:00-23:59");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = qstack::config::jwt::JwtConfig::from_env().unwrap();
        let _ = qstack::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _serial: tokio::sync::OwnedMutexGuard<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

/// Spawn the app against TEST_DATABASE_URL. Returns None (and the test
/// should bail out) when no test database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let serial = TEST_LOCK
        .get_or_init(|| Arc::new(tokio::sync::Mutex::new(())))
        .clone()
        .lock_owned()
        .await;

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        qstack::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let upload_config = qstack::services::upload::UploadConfig {
        upload_dir: "./test_uploads".to_string(),
    };
    let email_service = qstack::services::email::EmailService::from_env();
    let sms_service = qstack::services::sms::SmsService::from_env();
    let payment_service = qstack::services::payment::PaymentService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(qstack::routes::create_routes())
        .layer(axum::middleware::from_fn(
            qstack::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service))
        .layer(axum::extract::Extension(sms_service))
        .layer(axum::extract::Extension(payment_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        _serial: serial,
    })
}

async fn cleanup_tables(db: &DatabaseConnection) {
    // reverse dependency order; subscription_plans keeps its seed rows
    let tables = [
        "post_shares",
        "post_comments",
        "post_likes",
        "posts",
        "login_otps",
        "user_languages",
        "login_history",
        "password_resets",
        "user_subscriptions",
        "daily_question_limits",
        "daily_post_limits",
        "friendships",
        "reward_badges",
        "rewards",
        "votes",
        "answers",
        "questions",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Sign up a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, name_prefix: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_name = format!("{}_{}", name_prefix, counter);

    let resp = app
        .client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": unique_name,
            "email": format!("{}@test.com", unique_name),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to sign up user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse signup response for '{}': status={}, error={}",
            unique_name, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to sign up '{}': status={}, body={}",
            unique_name, status, body
        );
    }

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Signup response missing user id: {:?}", body))
        as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Signup response missing token: {:?}", body))
        .to_string();
    (user_id, token)
}

/// Wire up an accepted friendship directly in the database.
pub async fn make_friends(db: &DatabaseConnection, a: i32, b: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "INSERT INTO friendships (requester_id, recipient_id, status, created_at)
         VALUES ($1, $2, 'accepted', NOW())",
        vec![a.into(), b.into()],
    ))
    .await
    .expect("Failed to create friendship");
}

/// Set a user's reward balance directly, creating the account if needed.
pub async fn set_points(db: &DatabaseConnection, user_id: i32, points: i32, total_earned: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "INSERT INTO rewards (user_id, points, total_points_earned, total_points_spent)
         VALUES ($1, $2, $3, 0)
         ON CONFLICT (user_id)
         DO UPDATE SET points = EXCLUDED.points, total_points_earned = EXCLUDED.total_points_earned",
        vec![user_id.into(), points.into(), total_earned.into()],
    ))
    .await
    .expect("Failed to set points");
}

/// Fetch (points, total_points_earned, total_points_spent) for a user.
pub async fn get_points(db: &DatabaseConnection, user_id: i32) -> Option<(i32, i32, i32)> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT points, total_points_earned, total_points_spent FROM rewards WHERE user_id = $1",
            vec![user_id.into()],
        ))
        .await
        .expect("Failed to query rewards")?;

    Some((
        row.try_get::<i32>("", "points").unwrap(),
        row.try_get::<i32>("", "total_points_earned").unwrap(),
        row.try_get::<i32>("", "total_points_spent").unwrap(),
    ))
}

/// Ask a question as `token` and return its id.
pub async fn ask_question(app: &TestApp, token: &str, title: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/question/ask"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "body": "How does this work?",
            "tags": ["rust"]
        }))
        .send()
        .await
        .expect("Failed to ask question");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse question");
    body["data"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Ask failed: status={}, body={}", status, body)) as i32
}

/// Post an answer to `question_id` and return the answer id.
pub async fn post_answer(app: &TestApp, token: &str, question_id: i32) -> i32 {
    let resp = app
        .client
        .post(app.url(&format!("/answer/postanswer/{}", question_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "answer_body": "Use a transaction." }))
        .send()
        .await
        .expect("Failed to post answer");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse answer");
    let answers = body["data"]["answers"]
        .as_array()
        .unwrap_or_else(|| panic!("Answer failed: status={}, body={}", status, body));
    answers
        .last()
        .and_then(|a| a["id"].as_i64())
        .expect("Answer response missing id") as i32
}

/// Vote on an answer: value is "upvote" or "downvote".
pub async fn vote_answer(app: &TestApp, token: &str, answer_id: i32, value: &str) -> reqwest::Response {
    app.client
        .patch(app.url(&format!("/answer/vote/{}", answer_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "value": value }))
        .send()
        .await
        .expect("Failed to vote")
}

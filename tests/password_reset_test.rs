mod common;

use sea_orm::ConnectionTrait;
use serde_json::Value;

async fn latest_token(app: &common::TestApp, user_id: i32) -> String {
    let row = app
        .db
        .query_one(sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT reset_token FROM password_resets WHERE user_id = $1 ORDER BY id DESC LIMIT 1",
            vec![user_id.into()],
        ))
        .await
        .unwrap()
        .expect("reset row should exist");
    row.try_get("", "reset_token").unwrap()
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (user_id, _) = common::create_test_user(&app, "resetter").await;
    let email = {
        let row = app
            .db
            .query_one(sea_orm::Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT email FROM users WHERE id = $1",
                vec![user_id.into()],
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<String>("", "email").unwrap()
    };

    let resp = app
        .client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let token = latest_token(&app, user_id).await;

    // the token validates before use
    let resp = app
        .client
        .get(app.url(&format!("/password-reset/verify-token/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["reset_type"], "email");

    // consume it
    let resp = app
        .client
        .post(app.url("/password-reset/reset-password"))
        .json(&serde_json::json!({ "reset_token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // reuse fails well before natural expiry
    let resp = app
        .client
        .post(app.url("/password-reset/reset-password"))
        .json(&serde_json::json!({ "reset_token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // and it no longer validates
    let resp = app
        .client
        .get(app.url(&format!("/password-reset/verify-token/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn only_one_reset_request_per_day() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let resp = app
        .client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "limited",
            "email": "limited@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let first = app
        .client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({ "email": "limited@test.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({ "email": "limited@test.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
}

#[tokio::test]
async fn unknown_account_is_404_and_missing_input_is_400() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let resp = app
        .client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({ "email": "ghost@test.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn reset_actually_changes_the_password() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    app.client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "rotated",
            "email": "rotated@test.com",
            "password": "old_password_1"
        }))
        .send()
        .await
        .unwrap();

    let user_id = {
        let row = app
            .db
            .query_one(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT id FROM users WHERE email = 'rotated@test.com'".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i32>("", "id").unwrap()
    };

    app.client
        .post(app.url("/password-reset/request-reset"))
        .json(&serde_json::json!({ "email": "rotated@test.com" }))
        .send()
        .await
        .unwrap();

    let token = latest_token(&app, user_id).await;
    app.client
        .post(app.url("/password-reset/reset-password"))
        .json(&serde_json::json!({ "reset_token": token }))
        .send()
        .await
        .unwrap();

    // the old password no longer works
    let resp = app
        .client
        .post(app.url("/user/login"))
        .json(&serde_json::json!({
            "email": "rotated@test.com",
            "password": "old_password_1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

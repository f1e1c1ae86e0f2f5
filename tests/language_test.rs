mod common;

use sea_orm::ConnectionTrait;
use serde_json::Value;

async fn stored_otp(app: &common::TestApp, user_id: i32) -> String {
    let row = app
        .db
        .query_one(sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT otp_code FROM user_languages WHERE user_id = $1",
            vec![user_id.into()],
        ))
        .await
        .unwrap()
        .expect("language row should exist");
    row.try_get("", "otp_code").unwrap()
}

#[tokio::test]
async fn language_defaults_to_english() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "lang_default").await;

    let resp = app
        .client
        .get(app.url("/language"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["language"], "en");
}

#[tokio::test]
async fn language_change_requires_the_otp() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (user_id, token) = common::create_test_user(&app, "lang_changer").await;

    let resp = app
        .client
        .post(app.url("/language/request-change"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "language": "hi", "method": "email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // a wrong code is rejected and the language stays put
    let resp = app
        .client
        .post(app.url("/language/verify-change"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "otp": "000000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // the right code applies the staged language
    let code = stored_otp(&app, user_id).await;
    let resp = app
        .client
        .post(app.url("/language/verify-change"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["language"], "hi");

    // the challenge is cleared; replaying the code fails
    let resp = app
        .client
        .post(app.url("/language/verify-change"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unsupported_language_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "lang_invalid").await;

    let resp = app
        .client
        .post(app.url("/language/request-change"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "language": "xx", "method": "email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

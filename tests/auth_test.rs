mod common;

use serde_json::Value;

#[tokio::test]
async fn signup_returns_user_and_token() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let resp = app
        .client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "alice",
            "email": "alice@test.com",
            "password": "password123",
            "phone": "+911234567890"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "alice@test.com");
    assert!(body["data"]["token"].as_str().is_some());
    // password hash must never leak
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let payload = serde_json::json!({
        "name": "bob",
        "email": "bob@test.com",
        "password": "password123"
    });

    let first = app
        .client
        .post(app.url("/user/signup"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .post(app.url("/user/signup"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
}

#[tokio::test]
async fn login_with_wrong_password_is_400() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    common::create_test_user(&app, "loginuser").await;

    // find the user's email by signing up a fresh one with known creds
    let resp = app
        .client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "carol",
            "email": "carol@test.com",
            "password": "correct_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/user/login"))
        .json(&serde_json::json!({
            "email": "carol@test.com",
            "password": "wrong_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn login_with_unknown_email_is_404() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let resp = app
        .client
        .post(app.url("/user/login"))
        .json(&serde_json::json!({
            "email": "nobody@test.com",
            "password": "whatever123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn login_from_plain_client_succeeds_directly() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    app.client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "dave",
            "email": "dave@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url("/user/login"))
        .header(
            "user-agent",
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        )
        .json(&serde_json::json!({
            "email": "dave@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["token"].as_str().is_some());
}

#[tokio::test]
async fn chrome_login_requires_otp_and_records_no_token() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    app.client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "erin",
            "email": "erin@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url("/user/login"))
        .header(
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .json(&serde_json::json!({
            "email": "erin@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["requires_otp"], true);
    assert!(body["data"].get("token").is_none());

    // the code is persisted server-side; complete the login with it
    let user_id = body["data"]["user_id"].as_i64().unwrap();
    let row = sea_orm::ConnectionTrait::query_one(
        &app.db,
        sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT code FROM login_otps WHERE user_id = $1",
            vec![(user_id as i32).into()],
        ),
    )
    .await
    .unwrap()
    .expect("login OTP row should exist");
    let code: String = row.try_get("", "code").unwrap();

    let resp = app
        .client
        .post(app.url("/user/verify-login-otp"))
        .json(&serde_json::json!({ "user_id": user_id, "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["token"].as_str().is_some());

    // the code is single-use
    let resp = app
        .client
        .post(app.url("/user/verify-login-otp"))
        .json(&serde_json::json!({ "user_id": user_id, "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn login_attempts_are_audited() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    app.client
        .post(app.url("/user/signup"))
        .json(&serde_json::json!({
            "name": "frank",
            "email": "frank@test.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    // one failure, one success
    app.client
        .post(app.url("/user/login"))
        .json(&serde_json::json!({ "email": "frank@test.com", "password": "nope_nope" }))
        .send()
        .await
        .unwrap();
    let login = app
        .client
        .post(app.url("/user/login"))
        .json(&serde_json::json!({ "email": "frank@test.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    let token = login.json::<Value>().await.unwrap()["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .client
        .get(app.url("/login-history"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let history = body["data"].as_array().unwrap();
    assert!(history.len() >= 2);
    // newest first
    assert_eq!(history[0]["status"], "success");
    let statuses: Vec<&str> = history.iter().map(|h| h["status"].as_str().unwrap()).collect();
    assert!(statuses.contains(&"failure"));
}

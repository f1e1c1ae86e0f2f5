mod common;

use serde_json::Value;

async fn create_post(app: &common::TestApp, token: &str, content: &str) -> reqwest::Response {
    let form = reqwest::multipart::Form::new().text("content", content.to_string());
    app.client
        .post(app.url("/posts/create"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to create post")
}

#[tokio::test]
async fn posting_without_friends_is_forbidden() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "lonely").await;
    let resp = create_post(&app, &token, "hello world").await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn one_friend_means_one_post_per_day() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (poster_id, token) = common::create_test_user(&app, "poster").await;
    let (friend_id, _) = common::create_test_user(&app, "friend").await;
    common::make_friends(&app.db, poster_id, friend_id).await;

    let first = create_post(&app, &token, "first post").await;
    assert_eq!(first.status(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["remaining_posts"], 0);

    let second = create_post(&app, &token, "second post").await;
    assert_eq!(second.status(), 429);
}

#[tokio::test]
async fn daily_status_follows_the_live_friend_count() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (poster_id, token) = common::create_test_user(&app, "status_poster").await;
    let (f1, _) = common::create_test_user(&app, "status_f1").await;
    let (f2, _) = common::create_test_user(&app, "status_f2").await;
    common::make_friends(&app.db, poster_id, f1).await;
    common::make_friends(&app.db, poster_id, f2).await;

    // two friends: two posts allowed, both used
    assert_eq!(create_post(&app, &token, "one").await.status(), 200);
    assert_eq!(create_post(&app, &token, "two").await.status(), 200);

    // six more friends mid-day drops the allowance to 1 (3-9 bracket);
    // the count already spent stays, so posting stays blocked
    for i in 0..6 {
        let (f, _) = common::create_test_user(&app, &format!("status_extra_{}", i)).await;
        common::make_friends(&app.db, poster_id, f).await;
    }

    let resp = app
        .client
        .get(app.url("/posts/daily-status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["friend_count"], 8);
    assert_eq!(body["data"]["max_posts"], 1);
    assert_eq!(body["data"]["post_count"], 2);
    assert_eq!(body["data"]["can_post"], false);
}

#[tokio::test]
async fn likes_toggle_and_shares_do_not() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (poster_id, poster_token) = common::create_test_user(&app, "engager_poster").await;
    let (friend_id, friend_token) = common::create_test_user(&app, "engager_friend").await;
    common::make_friends(&app.db, poster_id, friend_id).await;

    let resp = create_post(&app, &poster_token, "like and share me").await;
    let body: Value = resp.json().await.unwrap();
    let post_id = body["data"]["post"]["id"].as_i64().unwrap();

    // like toggles on, then off
    let like = app
        .client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .bearer_auth(&friend_token)
        .send()
        .await
        .unwrap();
    let body: Value = like.json().await.unwrap();
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likes"], 1);

    let unlike = app
        .client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .bearer_auth(&friend_token)
        .send()
        .await
        .unwrap();
    let body: Value = unlike.json().await.unwrap();
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likes"], 0);

    // share is once-only
    let share = app
        .client
        .post(app.url(&format!("/posts/{}/share", post_id)))
        .bearer_auth(&friend_token)
        .send()
        .await
        .unwrap();
    assert_eq!(share.status(), 200);

    let reshare = app
        .client
        .post(app.url(&format!("/posts/{}/share", post_id)))
        .bearer_auth(&friend_token)
        .send()
        .await
        .unwrap();
    assert_eq!(reshare.status(), 409);
}

#[tokio::test]
async fn feed_is_public_and_paginated() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (poster_id, token) = common::create_test_user(&app, "feed_poster").await;
    // 10+ friends for an effectively unlimited allowance
    for i in 0..10 {
        let (f, _) = common::create_test_user(&app, &format!("feed_friend_{}", i)).await;
        common::make_friends(&app.db, poster_id, f).await;
    }

    for i in 0..3 {
        assert_eq!(
            create_post(&app, &token, &format!("post number {}", i))
                .await
                .status(),
            200
        );
    }

    let resp = app
        .client
        .get(app.url("/posts/feed?page=1&per_page=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let page = &body["data"];
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    // newest first
    assert_eq!(page["items"][0]["content"], "post number 2");
}

#[tokio::test]
async fn comments_require_content() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (poster_id, poster_token) = common::create_test_user(&app, "comment_poster").await;
    let (friend_id, friend_token) = common::create_test_user(&app, "comment_friend").await;
    common::make_friends(&app.db, poster_id, friend_id).await;

    let resp = create_post(&app, &poster_token, "comment on me").await;
    let body: Value = resp.json().await.unwrap();
    let post_id = body["data"]["post"]["id"].as_i64().unwrap();

    let empty = app
        .client
        .post(app.url(&format!("/posts/{}/comment", post_id)))
        .bearer_auth(&friend_token)
        .json(&serde_json::json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    let ok = app
        .client
        .post(app.url(&format!("/posts/{}/comment", post_id)))
        .bearer_auth(&friend_token)
        .json(&serde_json::json!({ "content": "nice post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["data"]["total_comments"], 1);
}

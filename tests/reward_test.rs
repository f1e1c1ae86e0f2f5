mod common;

use serde_json::Value;

#[tokio::test]
async fn answering_grants_five_points() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (asker_id, asker_token) = common::create_test_user(&app, "asker").await;
    let (peer_id, _) = common::create_test_user(&app, "peer").await;
    common::make_friends(&app.db, asker_id, peer_id).await;

    let question_id = common::ask_question(&app, &asker_token, "Points for answering?").await;

    let (answerer_id, answerer_token) = common::create_test_user(&app, "answerer").await;
    common::post_answer(&app, &answerer_token, question_id).await;

    let (points, earned, spent) = common::get_points(&app.db, answerer_id).await.unwrap();
    assert_eq!((points, earned, spent), (5, 5, 0));
}

#[tokio::test]
async fn grant_and_deduct_scenario() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (user_id, _) = common::create_test_user(&app, "ledger_user").await;
    let ledger = qstack::services::reward::RewardService::new(app.db.clone());

    let account = ledger.grant(user_id, 5, None).await.unwrap();
    assert_eq!((account.points, account.total_points_earned), (5, 5));

    let account = ledger.grant(user_id, 5, None).await.unwrap();
    assert_eq!((account.points, account.total_points_earned), (10, 10));

    // over-balance deduction is a silent no-op
    assert!(!ledger.deduct(user_id, 12).await.unwrap());
    let (points, _, spent) = common::get_points(&app.db, user_id).await.unwrap();
    assert_eq!((points, spent), (10, 0));

    assert!(ledger.deduct(user_id, 10).await.unwrap());
    let (points, _, spent) = common::get_points(&app.db, user_id).await.unwrap();
    assert_eq!((points, spent), (0, 10));
}

#[tokio::test]
async fn badges_accumulate_on_the_account() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (user_id, token) = common::create_test_user(&app, "badge_user").await;
    let ledger = qstack::services::reward::RewardService::new(app.db.clone());
    ledger.grant(user_id, 0, Some("Early Adopter")).await.unwrap();

    let resp = app
        .client
        .get(app.url("/reward/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    // a badge-only grant leaves the balance untouched
    assert_eq!(body["data"]["points"], 0);
    assert_eq!(body["data"]["badges"][0], "Early Adopter");
}

#[tokio::test]
async fn reward_status_creates_an_empty_account() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "fresh").await;

    let resp = app
        .client
        .get(app.url("/reward/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["points"], 0);
    assert_eq!(body["data"]["total_points_earned"], 0);
    assert_eq!(body["data"]["badges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn transfer_moves_points_atomically() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (sender_id, sender_token) = common::create_test_user(&app, "sender").await;
    let (recipient_id, _) = common::create_test_user(&app, "recipient").await;
    common::set_points(&app.db, sender_id, 25, 25).await;

    let resp = app
        .client
        .post(app.url("/reward/transfer"))
        .bearer_auth(&sender_token)
        .json(&serde_json::json!({ "recipient_id": recipient_id, "points": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (sender_points, _, sender_spent) = common::get_points(&app.db, sender_id).await.unwrap();
    assert_eq!(sender_points, 10);
    assert_eq!(sender_spent, 15);

    // recipient account was created by the credit
    let (recipient_points, recipient_earned, _) =
        common::get_points(&app.db, recipient_id).await.unwrap();
    assert_eq!(recipient_points, 15);
    assert_eq!(recipient_earned, 15);
}

#[tokio::test]
async fn transfer_below_minimum_balance_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (sender_id, sender_token) = common::create_test_user(&app, "poor_sender").await;
    let (recipient_id, _) = common::create_test_user(&app, "poor_recipient").await;
    // under the floor of 10, even though the amount is covered
    common::set_points(&app.db, sender_id, 9, 9).await;

    let resp = app
        .client
        .post(app.url("/reward/transfer"))
        .bearer_auth(&sender_token)
        .json(&serde_json::json!({ "recipient_id": recipient_id, "points": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // both sides untouched
    let (sender_points, _, sender_spent) = common::get_points(&app.db, sender_id).await.unwrap();
    assert_eq!((sender_points, sender_spent), (9, 0));
    assert!(common::get_points(&app.db, recipient_id).await.is_none());
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (sender_id, sender_token) = common::create_test_user(&app, "selfish").await;
    common::set_points(&app.db, sender_id, 50, 50).await;

    let resp = app
        .client
        .post(app.url("/reward/transfer"))
        .bearer_auth(&sender_token)
        .json(&serde_json::json!({ "recipient_id": sender_id, "points": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn leaderboard_orders_by_lifetime_earnings() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (a, _) = common::create_test_user(&app, "lb_a").await;
    let (b, _) = common::create_test_user(&app, "lb_b").await;
    let (c, _) = common::create_test_user(&app, "lb_c").await;
    common::set_points(&app.db, a, 10, 40).await;
    common::set_points(&app.db, b, 10, 90).await;
    common::set_points(&app.db, c, 10, 65).await;

    let resp = app
        .client
        .get(app.url("/reward/leaderboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let entries = body["data"].as_array().unwrap();
    assert!(entries.len() >= 3);
    assert_eq!(entries[0]["user_id"].as_i64().unwrap() as i32, b);
    assert_eq!(entries[1]["user_id"].as_i64().unwrap() as i32, c);
    assert_eq!(entries[2]["user_id"].as_i64().unwrap() as i32, a);
}

#[tokio::test]
async fn deleting_an_answer_takes_the_reward_back() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (asker_id, asker_token) = common::create_test_user(&app, "del_asker").await;
    let (peer_id, _) = common::create_test_user(&app, "del_peer").await;
    common::make_friends(&app.db, asker_id, peer_id).await;
    let question_id = common::ask_question(&app, &asker_token, "Delete me later").await;

    let (answerer_id, answerer_token) = common::create_test_user(&app, "del_answerer").await;
    let answer_id = common::post_answer(&app, &answerer_token, question_id).await;

    let (points, _, _) = common::get_points(&app.db, answerer_id).await.unwrap();
    assert_eq!(points, 5);

    let resp = app
        .client
        .delete(app.url(&format!("/answer/delete/{}", question_id)))
        .bearer_auth(&answerer_token)
        .json(&serde_json::json!({ "answer_id": answer_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (points, _, spent) = common::get_points(&app.db, answerer_id).await.unwrap();
    assert_eq!(points, 0);
    assert_eq!(spent, 5);
}

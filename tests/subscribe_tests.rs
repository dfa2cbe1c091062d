// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscribe and unsubscribe endpoints.

use axum::http::{header, StatusCode};
use liberty_weather::config::Config;
use liberty_weather::db::SupabaseDb;
use liberty_weather::models::SubscriberStatus;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn boston_body(email: &str) -> serde_json::Value {
    json!({ "email": email, "location": { "lat": 42.3601, "lon": -71.0589 } })
}

#[tokio::test]
async fn test_subscribe_then_unsubscribe() {
    let db = SupabaseDb::new_in_memory();
    let (app, _) = common::create_test_app_with(Config::test_default(), db.clone());

    let response = app
        .clone()
        .oneshot(common::post_json("/api/subscribe", &boston_body("a@example.com")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    // No Resend key configured
    assert_eq!(body["emailSent"], false);

    let row = db.get_subscriber("a@example.com").await.unwrap().unwrap();
    assert_eq!(row.status, SubscriberStatus::Active);

    let uri = format!(
        "/api/unsubscribe?token={}&email={}",
        row.unsubscribe_token,
        urlencoding::encode("a@example.com")
    );
    let response = app.oneshot(common::get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://localhost:3000/unsubscribe/success"
    );

    let row = db.get_subscriber("a@example.com").await.unwrap().unwrap();
    assert_eq!(row.status, SubscriberStatus::Cancelled);
    assert!(row.cancelled_at.is_some());
}

#[tokio::test]
async fn test_resubscribe_updates_row() {
    let db = SupabaseDb::new_in_memory();
    let (app, _) = common::create_test_app_with(Config::test_default(), db.clone());

    app.clone()
        .oneshot(common::post_json("/api/subscribe", &boston_body("a@example.com")))
        .await
        .unwrap();
    let response = app
        .oneshot(common::post_json(
            "/api/subscribe",
            &json!({ "email": "a@example.com", "location": { "lat": 39.7, "lon": -105.0 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = db.get_subscriber("a@example.com").await.unwrap().unwrap();
    assert_eq!(row.location.lat, 39.7);
}

#[tokio::test]
async fn test_padded_email_accepted_and_stored_trimmed() {
    let db = SupabaseDb::new_in_memory();
    let (app, _) = common::create_test_app_with(Config::test_default(), db.clone());

    let response = app
        .oneshot(common::post_json("/api/subscribe", &boston_body("  a@example.com \t")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = db.get_subscriber("a@example.com").await.unwrap().unwrap();
    assert_eq!(row.email, "a@example.com");
    assert!(db.get_subscriber("  a@example.com \t").await.unwrap().is_none());
}

#[tokio::test]
async fn test_welcome_email_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header_matcher("authorization", "Bearer re_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_1" })))
        .expect(1)
        .mount(&server)
        .await;
    let config = Config {
        resend_api_key: Some("re_test".to_string()),
        ..common::test_config(&server.uri())
    };
    let (app, _) = common::create_test_app_with(config, SupabaseDb::new_in_memory());

    let response = app
        .oneshot(common::post_json("/api/subscribe", &boston_body("a@example.com")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["emailSent"], true);
    server.verify().await;
}

#[tokio::test]
async fn test_invalid_subscribe_bodies_are_400() {
    let (app, _) = common::create_test_app();

    let bodies = [
        json!({ "email": "not-an-email", "location": { "lat": 1.0, "lon": 2.0 } }),
        json!({ "email": "a@example.com" }),
        json!({ "email": "a@example.com", "location": { "lat": "x", "lon": 2.0 } }),
        json!({ "email": "a@example.com", "location": { "lat": 91.0, "lon": 2.0 } }),
        json!({ "location": { "lat": 1.0, "lon": 2.0 } }),
    ];

    for body in bodies {
        let response = app
            .clone()
            .oneshot(common::post_json("/api/subscribe", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let (app, _) = common::create_test_app_with(Config::test_default(), SupabaseDb::new_mock());

    let response = app
        .oneshot(common::post_json("/api/subscribe", &boston_body("a@example.com")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::body_json(response).await["error"], "database_error");
}

#[tokio::test]
async fn test_unsubscribe_rejects_bad_links() {
    let db = SupabaseDb::new_in_memory();
    let (app, _) = common::create_test_app_with(Config::test_default(), db.clone());
    app.clone()
        .oneshot(common::post_json("/api/subscribe", &boston_body("a@example.com")))
        .await
        .unwrap();

    for uri in [
        "/api/unsubscribe",
        "/api/unsubscribe?email=a%40example.com",
        "/api/unsubscribe?token=deadbeef&email=a%40example.com",
    ] {
        let response = app.clone().oneshot(common::get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
    }

    let row = db.get_subscriber("a@example.com").await.unwrap().unwrap();
    assert_eq!(row.status, SubscriberStatus::Active);
}

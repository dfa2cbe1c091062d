// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active alert fetching: ordering and silent degradation.

use liberty_weather::config::DEFAULT_USER_AGENT;
use liberty_weather::models::{Location, Severity};
use liberty_weather::services::{AlertFetcher, NwsClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::BOSTON;

fn boston() -> Location {
    Location::new(42.3601, -71.0589, BOSTON.label)
}

fn fetcher(server: &MockServer, timeout: Duration) -> AlertFetcher {
    let nws = NwsClient::new(&server.uri(), DEFAULT_USER_AGENT).unwrap();
    AlertFetcher::new(nws, timeout)
}

fn feature(id: &str, event: &str, severity: &str) -> serde_json::Value {
    json!({
        "properties": {
            "id": id,
            "event": event,
            "headline": format!("{event} issued"),
            "description": "Details.",
            "effective": "2026-01-10T12:00:00-05:00",
            "expires": "2026-01-10T18:00:00-05:00",
            "severity": severity,
            "urgency": "Expected",
            "certainty": "Likely",
            "areaDesc": "Suffolk",
        }
    })
}

#[tokio::test]
async fn test_alerts_sorted_by_severity() {
    let server = MockServer::start().await;
    common::mount_alerts(
        &server,
        &BOSTON,
        json!([
            feature("a", "Frost Advisory", "Minor"),
            feature("b", "Winter Storm Warning", "Severe"),
            feature("c", "Special Weather Statement", "Whatever"),
            feature("d", "Blizzard Warning", "Extreme"),
            feature("e", "Wind Advisory", "Minor"),
        ]),
    )
    .await;

    let alerts = fetcher(&server, Duration::from_secs(3))
        .fetch_active(&boston())
        .await;

    let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
    // Equal severities keep provider order; unmapped sorts last
    assert_eq!(ids, ["d", "b", "a", "e", "c"]);
    assert_eq!(alerts[0].severity, Severity::Extreme);
    assert_eq!(alerts[4].severity, Severity::Unknown);
    assert_eq!(alerts[0].area_description.as_deref(), Some("Suffolk"));
}

#[tokio::test]
async fn test_server_error_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let alerts = fetcher(&server, Duration::from_secs(3))
        .fetch_active(&boston())
        .await;
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn test_slow_provider_times_out_to_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "features": [feature("a", "Flood Watch", "Severe")] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let alerts = fetcher(&server, Duration::from_millis(200))
        .fetch_active(&boston())
        .await;
    assert!(alerts.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_no_alerts() {
    let server = MockServer::start().await;
    common::mount_alerts(&server, &BOSTON, json!([])).await;

    let alerts = fetcher(&server, Duration::from_secs(3))
        .fetch_active(&boston())
        .await;
    assert!(alerts.is_empty());
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: offline apps and simulated providers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{Duration as ChronoDuration, DurationRound, Utc};
use liberty_weather::config::Config;
use liberty_weather::db::SupabaseDb;
use liberty_weather::routes::create_router;
use liberty_weather::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config with every provider pointed at `server_uri`.
pub fn test_config(server_uri: &str) -> Config {
    Config {
        weather_api_url: server_uri.to_string(),
        nominatim_api_url: server_uri.to_string(),
        mapbox_api_url: server_uri.to_string(),
        gemini_api_url: server_uri.to_string(),
        sun_times_api_url: server_uri.to_string(),
        resend_api_url: server_uri.to_string(),
        debounce: Duration::from_millis(50),
        ..Config::test_default()
    }
}

/// Create a test app with an in-memory subscriber store.
/// Returns the router and the shared state.
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), SupabaseDb::new_in_memory())
}

pub fn create_test_app_with(config: Config, db: SupabaseDb) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Simulated providers ─────────────────────────────────────

pub struct Place {
    pub query: &'static str,
    pub lat: &'static str,
    pub lon: &'static str,
    pub label: &'static str,
}

pub const BOSTON: Place = Place {
    query: "boston",
    lat: "42.3601",
    lon: "-71.0589",
    label: "Boston, Massachusetts, United States",
};

pub const CHICAGO: Place = Place {
    query: "chicago",
    lat: "41.8781",
    lon: "-87.6298",
    label: "Chicago, Illinois, United States",
};

pub const DENVER: Place = Place {
    query: "denver",
    lat: "39.7392",
    lon: "-104.9903",
    label: "Denver, Colorado, United States",
};

/// Nominatim answer for `place.query`.
pub fn geocode_mock(place: &Place) -> Mock {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", place.query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": place.lat,
            "lon": place.lon,
            "display_name": place.label,
        }])))
}

/// Nominatim answer with no results.
pub fn geocode_empty_mock(query: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
}

/// Hourly periods starting at the current hour, Fahrenheit.
pub fn hourly_periods(temps_f: &[i64], short_forecast: &str) -> Value {
    let start = Utc::now()
        .duration_trunc(ChronoDuration::hours(1))
        .unwrap();
    let periods: Vec<Value> = temps_f
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let s = start + ChronoDuration::hours(i as i64);
            json!({
                "number": i + 1,
                "startTime": s.to_rfc3339(),
                "endTime": (s + ChronoDuration::hours(1)).to_rfc3339(),
                "isDaytime": true,
                "temperature": t,
                "temperatureUnit": "F",
                "windSpeed": "10 mph",
                "windDirection": "NW",
                "icon": "https://api.weather.gov/icons/land/day/few?size=small",
                "shortForecast": short_forecast,
                "detailedForecast": "",
            })
        })
        .collect();
    json!({ "properties": { "periods": periods } })
}

/// Point metadata, hourly forecast, stations and a live reading for
/// `place`, served by `server`.
pub async fn mount_forecast(
    server: &MockServer,
    place: &Place,
    temps_f: &[i64],
    short_forecast: &str,
    observed_celsius: Option<f64>,
) {
    let grid = format!("/gridpoints/{}", place.query);
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path(format!("/points/{},{}", place.lat, place.lon)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {
                "forecastHourly": format!("{uri}{grid}/forecast/hourly"),
                "observationStations": format!("{uri}{grid}/stations"),
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{grid}/forecast/hourly")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(hourly_periods(temps_f, short_forecast)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{grid}/stations")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [{ "id": format!("{uri}/stations/{}", place.query) }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/stations/{}/observations/latest", place.query)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {
                "temperature": { "unitCode": "wmoUnit:degC", "value": observed_celsius }
            }
        })))
        .mount(server)
        .await;
}

/// Active alerts for `place`.
pub async fn mount_alerts(server: &MockServer, place: &Place, features: Value) {
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .and(query_param("point", format!("{},{}", place.lat, place.lon)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": features })))
        .mount(server)
        .await;
}

/// Everything needed for `place` to settle successfully.
pub async fn mount_place(server: &MockServer, place: &Place, temps_f: &[i64]) {
    geocode_mock(place).mount(server).await;
    mount_forecast(server, place, temps_f, "Sunny", None).await;
    mount_alerts(server, place, json!([])).await;
}

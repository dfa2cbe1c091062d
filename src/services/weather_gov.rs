// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! weather.gov API client.
//!
//! Handles:
//! - Point metadata (hourly forecast + observation station URLs)
//! - Hourly forecast periods
//! - Latest observation from the nearest station
//! - Active alerts for a point
//!
//! Every call carries the configured User-Agent; weather.gov throttles
//! anonymous clients.

use crate::error::WeatherError;
use crate::models::conditions::{fahrenheit_to_celsius, round_half_up};
use crate::services::provider::{check_response_json, transport_error};
use chrono::{DateTime, FixedOffset};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

const PROVIDER: &str = "weather.gov";

/// weather.gov client.
#[derive(Clone)]
pub struct NwsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NwsClient {
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve point metadata for coordinates.
    pub async fn point(&self, latitude: f64, longitude: f64) -> Result<PointProperties, WeatherError> {
        let url = format!("{}/points/{:.4},{:.4}", self.base_url, latitude, longitude);
        let point: PointResponse = self.get_json(&url).await?;
        Ok(point.properties)
    }

    /// Fetch the hourly forecast series from the URL given by point metadata.
    pub async fn hourly_periods(&self, url: &str) -> Result<Vec<ForecastPeriod>, WeatherError> {
        let forecast: HourlyForecastResponse = self.get_json(url).await?;
        tracing::debug!(
            periods = forecast.properties.periods.len(),
            "Fetched hourly forecast"
        );
        Ok(forecast.properties.periods)
    }

    /// Latest observed temperature in Celsius at the first listed station.
    ///
    /// Every failure here is `DegradedObservation`; callers fall back to
    /// the forecast temperature.
    pub async fn latest_observation_celsius(&self, stations_url: &str) -> Result<f64, WeatherError> {
        let degraded = |e: WeatherError| WeatherError::DegradedObservation(e.to_string());

        let stations: StationsResponse = self.get_json(stations_url).await.map_err(degraded)?;
        let station = stations
            .features
            .first()
            .ok_or_else(|| WeatherError::DegradedObservation("no stations listed".to_string()))?;

        let url = format!("{}/observations/latest", station.id.trim_end_matches('/'));
        let observation: ObservationResponse = self.get_json(&url).await.map_err(degraded)?;

        observation
            .properties
            .temperature
            .and_then(|t| t.value)
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                WeatherError::DegradedObservation(format!("no temperature at {}", station.id))
            })
    }

    /// Raw active alerts for a point, in provider order.
    pub async fn active_alerts(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<AlertProperties>, WeatherError> {
        let url = format!("{}/alerts/active", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("point", format!("{:.4},{:.4}", latitude, longitude))])
            .send()
            .await
            .map_err(|e| WeatherError::AlertFetch(e.to_string()))?;

        let alerts: AlertsResponse = check_response_json(PROVIDER, response)
            .await
            .map_err(|e| WeatherError::AlertFetch(e.to_string()))?;

        Ok(alerts.features.into_iter().map(|f| f.properties).collect())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, WeatherError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        check_response_json(PROVIDER, response).await
    }
}

// ── Response types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointProperties {
    #[serde(default)]
    pub forecast_hourly: Option<String>,
    #[serde(default)]
    pub observation_stations: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastResponse {
    properties: HourlyForecastProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

/// One hourly forecast period. Times keep the forecast office's offset
/// so hour labels read in local time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub is_daytime: bool,
    pub temperature: PeriodTemperature,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub wind_speed: Option<String>,
    #[serde(default)]
    pub wind_direction: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

/// Plain number (with `temperatureUnit`) or a QuantitativeValue.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeriodTemperature {
    Number(f64),
    Quantity(QuantValue),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantValue {
    #[serde(default)]
    pub unit_code: String,
    pub value: Option<f64>,
}

impl ForecastPeriod {
    /// Period temperature in whole degrees Celsius.
    pub fn temperature_celsius(&self) -> Option<i64> {
        let (value, celsius) = match &self.temperature {
            PeriodTemperature::Number(v) => {
                (*v, self.temperature_unit.as_deref() == Some("C"))
            }
            PeriodTemperature::Quantity(q) => (q.value?, q.unit_code.ends_with("degC")),
        };
        if !value.is_finite() {
            return None;
        }
        Some(if celsius {
            round_half_up(value)
        } else {
            fahrenheit_to_celsius(value)
        })
    }
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
struct ObservationProperties {
    #[serde(default)]
    temperature: Option<QuantValue>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

/// Alert fields as the provider sends them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub sent: Option<String>,
    #[serde(default)]
    pub effective: Option<String>,
    #[serde(default)]
    pub onset: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub ends: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub certainty: Option<String>,
    #[serde(default)]
    pub area_desc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period(temperature: serde_json::Value, unit: Option<&str>) -> ForecastPeriod {
        serde_json::from_value(json!({
            "startTime": "2026-07-04T15:00:00-04:00",
            "endTime": "2026-07-04T16:00:00-04:00",
            "isDaytime": true,
            "temperature": temperature,
            "temperatureUnit": unit,
            "shortForecast": "Sunny"
        }))
        .unwrap()
    }

    #[test]
    fn test_plain_fahrenheit_temperature() {
        assert_eq!(period(json!(98.6), Some("F")).temperature_celsius(), Some(37));
    }

    #[test]
    fn test_plain_celsius_temperature() {
        assert_eq!(period(json!(21.5), Some("C")).temperature_celsius(), Some(22));
    }

    #[test]
    fn test_quantitative_temperature() {
        let q = period(json!({"unitCode": "wmoUnit:degC", "value": 18.2}), None);
        assert_eq!(q.temperature_celsius(), Some(18));

        let f = period(json!({"unitCode": "wmoUnit:degF", "value": 32.0}), None);
        assert_eq!(f.temperature_celsius(), Some(0));

        let missing = period(json!({"unitCode": "wmoUnit:degC", "value": null}), None);
        assert_eq!(missing.temperature_celsius(), None);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forecast fetching: point → hourly series → (best effort) live reading,
//! merged into current conditions plus an hourly strip.

use crate::error::{Degrade, WeatherError};
use crate::models::conditions::{round_half_up, CurrentConditions, Forecast, HourlyPoint, IconKind};
use crate::models::location::Location;
use crate::services::weather_gov::{ForecastPeriod, NwsClient};
use crate::time_utils::format_hour_label;
use chrono::{DateTime, Utc};

/// Fetches and shapes forecasts for a location.
#[derive(Clone)]
pub struct ForecastFetcher {
    nws: NwsClient,
    window: usize,
}

impl ForecastFetcher {
    /// `window` is the number of hourly points returned (12 to 24).
    pub fn new(nws: NwsClient, window: usize) -> Self {
        Self { nws, window }
    }

    pub async fn fetch(&self, location: &Location) -> Result<Forecast, WeatherError> {
        self.fetch_at(location, Utc::now()).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit "now".
    pub async fn fetch_at(
        &self,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<Forecast, WeatherError> {
        let point = self
            .nws
            .point(location.latitude, location.longitude)
            .await
            .map_err(|e| WeatherError::Unavailable(format!("point metadata: {e}")))?;

        let hourly_url = point.forecast_hourly.ok_or_else(|| {
            WeatherError::Unavailable("point metadata has no hourly forecast".to_string())
        })?;

        let periods = self
            .nws
            .hourly_periods(&hourly_url)
            .await
            .map_err(|e| WeatherError::Unavailable(format!("hourly forecast: {e}")))?;

        let observed = match point.observation_stations {
            Some(stations_url) => self
                .nws
                .latest_observation_celsius(&stations_url)
                .await
                .or_degrade("observation"),
            None => None,
        };

        tracing::debug!(
            label = %location.label,
            periods = periods.len(),
            live = observed.is_some(),
            "Forecast fetched"
        );

        build_forecast(&periods, observed, now, self.window)
    }
}

/// Index of the period whose window contains `now`, or 0 when none does
/// (stale or future-only data).
pub fn select_now_index(periods: &[ForecastPeriod], now: DateTime<Utc>) -> usize {
    periods
        .iter()
        .position(|p| contains(p, now))
        .unwrap_or(0)
}

fn contains(period: &ForecastPeriod, now: DateTime<Utc>) -> bool {
    period.start_time.with_timezone(&Utc) <= now && now < period.end_time.with_timezone(&Utc)
}

/// Merge the hourly series with an optional live reading.
///
/// The live Celsius reading, when present, replaces the forecast
/// temperature for the "now" slot only.
pub fn build_forecast(
    periods: &[ForecastPeriod],
    observed_celsius: Option<f64>,
    now: DateTime<Utc>,
    window: usize,
) -> Result<Forecast, WeatherError> {
    let usable: Vec<(&ForecastPeriod, i64)> = periods
        .iter()
        .filter_map(|p| p.temperature_celsius().map(|t| (p, t)))
        .collect();

    if usable.is_empty() {
        return Err(WeatherError::Unavailable(
            "hourly forecast has no periods".to_string(),
        ));
    }

    let now_index = usable
        .iter()
        .position(|(p, _)| contains(p, now))
        .unwrap_or(0);
    let (now_period, forecast_temp) = usable[now_index];

    let temperature_celsius = observed_celsius
        .filter(|v| v.is_finite())
        .map(round_half_up)
        .unwrap_or(forecast_temp);

    let current = CurrentConditions {
        temperature_celsius,
        short_description: now_period.short_forecast.clone(),
        detailed_description: now_period.detailed_forecast.clone(),
        wind_speed: now_period.wind_speed.clone().unwrap_or_default(),
        wind_direction: now_period.wind_direction.clone().unwrap_or_default(),
        icon_ref: now_period.icon.clone().unwrap_or_default(),
        observed_at: now,
        is_daytime: now_period.is_daytime,
    };

    let hourly = usable[now_index..]
        .iter()
        .take(window)
        .enumerate()
        .map(|(i, (period, temp))| HourlyPoint {
            label: if i == 0 {
                "Now".to_string()
            } else {
                format_hour_label(&period.start_time)
            },
            temperature_celsius: if i == 0 { temperature_celsius } else { *temp },
            short_description: period.short_forecast.clone(),
            icon_kind: IconKind::from_description(&period.short_forecast),
        })
        .collect();

    Ok(Forecast { current, hourly })
}

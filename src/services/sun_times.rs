// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sunrise/sunset resolution.
//!
//! Order: sunrise-sunset API (2 s timeout) → astronomical approximation →
//! fixed 06:30/18:30 local mean solar time. Results are cached for 30
//! minutes per location label.

use crate::error::{Degrade, WeatherError};
use crate::models::location::Location;
use crate::models::sun::{SunSource, SunTimes};
use crate::services::cache::TtlCache;
use crate::services::provider::{check_response_json, transport_error};
use crate::time_utils::parse_rfc3339;
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;
use std::f64::consts::PI;
use std::time::Duration;

pub const SUN_TIMES_TTL: Duration = Duration::from_secs(30 * 60);
const API_TIMEOUT: Duration = Duration::from_secs(2);

pub type SunTimesCache = TtlCache<String, SunTimes>;

#[derive(Clone)]
pub struct SunTimesResolver {
    http: reqwest::Client,
    /// `None` skips the API step entirely (offline/tests)
    base_url: Option<String>,
    cache: SunTimesCache,
}

impl SunTimesResolver {
    pub fn new(http: reqwest::Client, base_url: Option<&str>, cache: SunTimesCache) -> Self {
        Self {
            http,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            cache,
        }
    }

    pub fn cache(&self) -> &SunTimesCache {
        &self.cache
    }

    pub async fn resolve(&self, location: &Location) -> SunTimes {
        self.resolve_at(location, Utc::now()).await
    }

    pub async fn resolve_at(&self, location: &Location, now: DateTime<Utc>) -> SunTimes {
        let key = location.label.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let from_api = match &self.base_url {
            Some(base_url) => self
                .fetch(base_url, location)
                .await
                .or_degrade("sun_times_api"),
            None => None,
        };

        let sun_times = from_api
            .or_else(|| approximate(location.latitude, location.longitude, now.date_naive()))
            .unwrap_or_else(|| {
                tracing::debug!(label = %location.label, "Using default sun times");
                default_times(location.longitude, now.date_naive())
            });

        self.cache.set(key, sun_times.clone());
        sun_times
    }

    async fn fetch(&self, base_url: &str, location: &Location) -> Result<SunTimes, WeatherError> {
        let response = self
            .http
            .get(format!("{}/json", base_url))
            .query(&[
                ("lat", format!("{:.4}", location.latitude)),
                ("lng", format!("{:.4}", location.longitude)),
                ("formatted", "0".to_string()),
            ])
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_error("sun_times", e))?;

        let body: SunApiResponse = check_response_json("sun_times", response).await?;
        if body.status != "OK" {
            return Err(WeatherError::Provider(format!(
                "sun_times status {}",
                body.status
            )));
        }

        let parse = |raw: &str| {
            parse_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .ok_or_else(|| WeatherError::Provider(format!("sun_times bad timestamp {raw}")))
        };

        Ok(SunTimes {
            sunrise: parse(&body.results.sunrise)?,
            sunset: parse(&body.results.sunset)?,
            source: SunSource::Provider,
        })
    }
}

/// Declination + hour-angle approximation. `None` during polar day or
/// night, when the sun doesn't cross the horizon.
pub fn approximate(latitude: f64, longitude: f64, date: NaiveDate) -> Option<SunTimes> {
    let day_of_year = date.ordinal() as f64;
    let declination = 23.44_f64.to_radians() * (2.0 * PI * (284.0 + day_of_year) / 365.0).sin();

    let cos_hour_angle = -latitude.to_radians().tan() * declination.tan();
    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        return None;
    }
    let half_day_hours = cos_hour_angle.acos().to_degrees() / 15.0;
    let solar_noon_utc = 12.0 - longitude / 15.0;

    Some(SunTimes {
        sunrise: at_utc_hours(date, solar_noon_utc - half_day_hours)?,
        sunset: at_utc_hours(date, solar_noon_utc + half_day_hours)?,
        source: SunSource::Approximation,
    })
}

/// 06:30 and 18:30 local mean solar time.
pub fn default_times(longitude: f64, date: NaiveDate) -> SunTimes {
    let offset = longitude / 15.0;
    let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let shift = |hours: f64| midnight + TimeDelta::seconds(((hours - offset) * 3600.0) as i64);

    SunTimes {
        sunrise: shift(6.5),
        sunset: shift(18.5),
        source: SunSource::Default,
    }
}

fn at_utc_hours(date: NaiveDate, hours: f64) -> Option<DateTime<Utc>> {
    if !hours.is_finite() {
        return None;
    }
    let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc();
    midnight.checked_add_signed(TimeDelta::seconds((hours * 3600.0).round() as i64))
}

#[derive(Debug, Deserialize)]
struct SunApiResponse {
    results: SunApiResults,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct SunApiResults {
    sunrise: String,
    sunset: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn june_21() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 21).unwrap()
    }

    #[test]
    fn test_approximation_boston_summer() {
        let times = approximate(42.36, -71.06, june_21()).unwrap();
        assert_eq!(times.source, SunSource::Approximation);
        // Around 05:10 EDT, i.e. 09:10 UTC
        assert_eq!(times.sunrise.hour(), 9);
        let day_length = times.sunset - times.sunrise;
        assert!(day_length > TimeDelta::hours(14) && day_length < TimeDelta::hours(16));
    }

    #[test]
    fn test_polar_night_has_no_approximation() {
        let december = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        assert!(approximate(80.0, 15.0, december).is_none());
    }

    #[test]
    fn test_default_times_follow_longitude() {
        let times = default_times(-75.0, june_21());
        assert_eq!(times.source, SunSource::Default);
        assert_eq!((times.sunrise.hour(), times.sunrise.minute()), (11, 30));
        assert_eq!((times.sunset.hour(), times.sunset.minute()), (23, 30));
    }

    #[tokio::test]
    async fn test_offline_resolver_caches_by_label() {
        let cache = SunTimesCache::new(SUN_TIMES_TTL);
        let resolver = SunTimesResolver::new(reqwest::Client::new(), None, cache.clone());
        let location = Location::new(80.0, 15.0, "Longyearbyen");

        let now = DateTime::parse_from_rfc3339("2026-12-21T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let times = resolver.resolve_at(&location, now).await;

        assert_eq!(times.source, SunSource::Default);
        assert_eq!(cache.get(&"longyearbyen".to_string()), Some(times));
    }
}

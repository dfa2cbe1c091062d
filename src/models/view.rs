// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The combined weather view-model and its state machine.
//!
//! Presentation layers only ever read a [`WeatherView`]. It is mutated
//! exclusively through [`WeatherView::apply`], one [`Transition`] at a
//! time, so independent async branches (forecast, alerts, summary, sun
//! times) can't leave it half-updated.

use crate::error::WeatherError;
use crate::models::alert::Alert;
use crate::models::conditions::{placeholder_hourly, CurrentConditions, Forecast, HourlyPoint};
use crate::models::location::Location;
use crate::models::sun::SunTimes;
use crate::models::theme::Theme;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Progress of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum StageState {
    #[default]
    NotStarted,
    InFlight,
    Succeeded,
    Failed,
}

impl StageState {
    pub fn is_loading(self) -> bool {
        self == StageState::InFlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Stages {
    pub geocoding: StageState,
    pub forecast: StageState,
    pub alerts: StageState,
    pub summary: StageState,
    pub sun_times: StageState,
}

/// Where the current request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Phase {
    #[default]
    Idle,
    Geocoding,
    Forecasting,
    Summarizing,
    Settled,
}

/// User-visible error. Only geocoding failures end up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ViewError {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeatherView {
    /// Sequence number of the request that last wrote this view
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub request_id: u64,
    pub query: Option<String>,
    pub location: Option<Location>,
    pub conditions: Option<CurrentConditions>,
    pub hourly: Vec<HourlyPoint>,
    /// True while `hourly` holds the placeholder series
    pub hourly_is_placeholder: bool,
    pub alerts: Vec<Alert>,
    pub summary: String,
    pub sun_times: Option<SunTimes>,
    pub theme: Theme,
    pub stages: Stages,
    pub phase: Phase,
    pub error: Option<ViewError>,
    /// Set when loading took too long and fallback data is being shown
    pub watchdog_expired: bool,
}

impl Default for WeatherView {
    fn default() -> Self {
        Self {
            request_id: 0,
            query: None,
            location: None,
            conditions: None,
            hourly: placeholder_hourly(),
            hourly_is_placeholder: true,
            alerts: Vec::new(),
            summary: String::new(),
            sun_times: None,
            theme: Theme::default(),
            stages: Stages::default(),
            phase: Phase::Idle,
            error: None,
            watchdog_expired: false,
        }
    }
}

/// The only ways a view changes.
#[derive(Debug, Clone)]
pub enum Transition {
    Started { request_id: u64, query: String },
    Geocoded(Location),
    GeocodeFailed(WeatherError),
    ForecastLoaded(Forecast),
    ForecastFailed(WeatherError),
    AlertsLoaded(Vec<Alert>),
    SummaryReady(String),
    SunTimesResolved(SunTimes),
    /// Loading ran past the watchdog; show what we have plus fallbacks.
    WatchdogExpired { fallback_summary: String },
}

impl WeatherView {
    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Settled
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Started { request_id, query } => {
                self.request_id = request_id;
                self.query = Some(query);
                self.phase = Phase::Geocoding;
                self.error = None;
                self.watchdog_expired = false;
                self.stages = Stages {
                    geocoding: StageState::InFlight,
                    alerts: self.stages.alerts,
                    ..Stages::default()
                };
                self.ensure_hourly();
            }
            Transition::Geocoded(location) => {
                let moved = self
                    .location
                    .as_ref()
                    .is_none_or(|current| !current.same_place(&location));
                if moved {
                    // Alerts belong to the old place; the new poller refills them.
                    self.alerts.clear();
                    self.stages.alerts = StageState::InFlight;
                    self.sun_times = None;
                }
                self.location = Some(location);
                self.stages.geocoding = StageState::Succeeded;
                self.stages.forecast = StageState::InFlight;
                self.stages.sun_times = StageState::InFlight;
                self.phase = Phase::Forecasting;
            }
            Transition::GeocodeFailed(err) => {
                // Previous location and conditions stay on screen.
                self.stages.geocoding = StageState::Failed;
                self.error = Some(ViewError {
                    kind: match err {
                        WeatherError::NotFound(_) => "not_found",
                        WeatherError::EmptyQuery => "empty_query",
                        _ => "geocoding_failed",
                    }
                    .to_string(),
                    message: err.to_string(),
                });
                self.phase = Phase::Settled;
            }
            Transition::ForecastLoaded(forecast) => {
                // The old advisory described the old conditions.
                self.summary.clear();
                self.conditions = Some(forecast.current);
                if forecast.hourly.is_empty() {
                    self.ensure_hourly();
                } else {
                    self.hourly = forecast.hourly;
                    self.hourly_is_placeholder = false;
                }
                self.stages.forecast = StageState::Succeeded;
                self.stages.summary = StageState::InFlight;
                self.phase = Phase::Summarizing;
            }
            Transition::ForecastFailed(_) => {
                // Keep whatever was displayed before; never blank the strip.
                self.stages.forecast = StageState::Failed;
                self.ensure_hourly();
                self.phase = Phase::Settled;
            }
            Transition::AlertsLoaded(alerts) => {
                self.alerts = alerts;
                self.stages.alerts = StageState::Succeeded;
            }
            Transition::SummaryReady(summary) => {
                self.summary = summary;
                self.stages.summary = StageState::Succeeded;
                if self.phase == Phase::Summarizing {
                    self.phase = Phase::Settled;
                }
            }
            Transition::SunTimesResolved(sun_times) => {
                self.sun_times = Some(sun_times);
                self.stages.sun_times = StageState::Succeeded;
            }
            Transition::WatchdogExpired { fallback_summary } => {
                if self.phase != Phase::Settled {
                    self.watchdog_expired = true;
                    self.ensure_hourly();
                    if self.stages.summary != StageState::Succeeded || self.summary.is_empty() {
                        self.summary = fallback_summary;
                    }
                }
            }
        }
        self.theme = Theme::derive(self.conditions.as_ref(), &self.alerts);
    }

    fn ensure_hourly(&mut self) {
        if self.hourly.is_empty() {
            self.hourly = placeholder_hourly();
            self.hourly_is_placeholder = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conditions::IconKind;
    use chrono::Utc;

    fn conditions(temp: i64, text: &str) -> CurrentConditions {
        CurrentConditions {
            temperature_celsius: temp,
            short_description: text.to_string(),
            detailed_description: String::new(),
            wind_speed: "5 mph".to_string(),
            wind_direction: "N".to_string(),
            icon_ref: String::new(),
            observed_at: Utc::now(),
            is_daytime: true,
        }
    }

    fn started(view: &mut WeatherView, id: u64, query: &str) {
        view.apply(Transition::Started {
            request_id: id,
            query: query.to_string(),
        });
    }

    #[test]
    fn test_happy_path_walks_every_phase() {
        let mut view = WeatherView::default();
        assert_eq!(view.phase, Phase::Idle);

        started(&mut view, 1, "denver");
        assert_eq!(view.phase, Phase::Geocoding);
        assert!(view.stages.geocoding.is_loading());

        view.apply(Transition::Geocoded(Location::new(39.74, -104.99, "Denver")));
        assert_eq!(view.phase, Phase::Forecasting);

        view.apply(Transition::ForecastLoaded(Forecast {
            current: conditions(30, "Sunny"),
            hourly: vec![HourlyPoint {
                label: "Now".to_string(),
                temperature_celsius: 30,
                short_description: "Sunny".to_string(),
                icon_kind: IconKind::Sun,
            }],
        }));
        assert_eq!(view.phase, Phase::Summarizing);
        assert!(!view.hourly_is_placeholder);
        assert_eq!(view.theme.outfit, crate::models::theme::MascotOutfit::Summer);

        view.apply(Transition::SummaryReady("Hot and sunny.".to_string()));
        assert!(view.is_settled());
        assert_eq!(view.summary, "Hot and sunny.");
    }

    #[test]
    fn test_geocode_failure_keeps_previous_state() {
        let mut view = WeatherView::default();
        started(&mut view, 1, "boston");
        view.apply(Transition::Geocoded(Location::new(42.36, -71.06, "Boston")));
        view.apply(Transition::ForecastLoaded(Forecast {
            current: conditions(10, "Cloudy"),
            hourly: Vec::new(),
        }));
        view.apply(Transition::SummaryReady("Cool.".to_string()));

        started(&mut view, 2, "atlantis");
        view.apply(Transition::GeocodeFailed(WeatherError::NotFound(
            "atlantis".to_string(),
        )));

        assert!(view.is_settled());
        assert_eq!(view.location.as_ref().unwrap().label, "Boston");
        assert_eq!(view.conditions.as_ref().unwrap().temperature_celsius, 10);
        assert_eq!(view.error.as_ref().unwrap().kind, "not_found");
    }

    #[test]
    fn test_forecast_failure_never_blanks_hourly() {
        let mut view = WeatherView {
            hourly: Vec::new(),
            ..WeatherView::default()
        };
        started(&mut view, 1, "denver");
        view.apply(Transition::Geocoded(Location::new(39.74, -104.99, "Denver")));
        view.apply(Transition::ForecastFailed(WeatherError::Unavailable(
            "points".to_string(),
        )));

        assert!(view.is_settled());
        assert_eq!(view.stages.forecast, StageState::Failed);
        assert_eq!(view.hourly.len(), 12);
        assert!(view.hourly_is_placeholder);
        assert!(view.error.is_none());
    }

    #[test]
    fn test_new_location_clears_old_alerts() {
        let mut view = WeatherView::default();
        view.apply(Transition::Geocoded(Location::new(1.0, 1.0, "A")));
        view.apply(Transition::AlertsLoaded(vec![]));
        assert_eq!(view.stages.alerts, StageState::Succeeded);

        view.apply(Transition::Geocoded(Location::new(2.0, 2.0, "B")));
        assert_eq!(view.stages.alerts, StageState::InFlight);
    }

    #[test]
    fn test_watchdog_only_fires_before_settle() {
        let mut view = WeatherView::default();
        started(&mut view, 1, "denver");
        view.apply(Transition::WatchdogExpired {
            fallback_summary: "Fallback.".to_string(),
        });
        assert!(view.watchdog_expired);
        assert_eq!(view.summary, "Fallback.");

        let mut settled = WeatherView::default();
        started(&mut settled, 1, "denver");
        settled.apply(Transition::GeocodeFailed(WeatherError::NotFound("x".into())));
        settled.apply(Transition::WatchdogExpired {
            fallback_summary: "Fallback.".to_string(),
        });
        assert!(!settled.watchdog_expired);
    }

    #[test]
    fn test_new_conditions_drop_previous_advisory() {
        let mut view = WeatherView::default();
        started(&mut view, 1, "boston");
        view.apply(Transition::Geocoded(Location::new(42.36, -71.06, "Boston")));
        view.apply(Transition::ForecastLoaded(Forecast {
            current: conditions(21, "Sunny"),
            hourly: Vec::new(),
        }));
        view.apply(Transition::SummaryReady("Boston advice.".to_string()));

        started(&mut view, 2, "chicago");
        view.apply(Transition::Geocoded(Location::new(41.88, -87.63, "Chicago")));
        view.apply(Transition::ForecastLoaded(Forecast {
            current: conditions(-1, "Snow"),
            hourly: Vec::new(),
        }));
        assert_eq!(view.stages.summary, StageState::InFlight);
        assert!(view.summary.is_empty());

        view.apply(Transition::WatchdogExpired {
            fallback_summary: "Cold advisory.".to_string(),
        });
        assert_eq!(view.summary, "Cold advisory.");

        // A late generated summary still wins
        view.apply(Transition::SummaryReady("Chicago advice.".to_string()));
        assert!(view.is_settled());
        assert_eq!(view.summary, "Chicago advice.");
    }
}

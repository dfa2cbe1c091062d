// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-session weather orchestration.
//!
//! Each location change gets a monotonically increasing request id and a
//! cancellation token. A new change cancels the previous request, and
//! every commit into the shared view checks that its request id is still
//! the latest, so superseded work can never write stale results.
//!
//! Pipeline per request:
//! 1. debounce
//! 2. geocode (failure: keep previous data, surface error)
//! 3. restart the alert poller if the place changed
//! 4. forecast and sun times concurrently
//! 5. summary (generated, cached, or static fallback)
//!
//! A watchdog marks the view as expired if loading runs too long, so
//! presentation can show partial data.

use crate::config::Config;
use crate::error::WeatherError;
use crate::models::alert::Alert;
use crate::models::location::Location;
use crate::models::view::{Transition, WeatherView};
use crate::services::geocoder::normalize_query;
use crate::services::summary::{default_sentence, fallback_advisory};
use crate::services::WeatherServices;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

/// Interval between alert polls for the active location.
pub const ALERT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How long "everything loading" may be shown before falling back.
pub const LOADING_WATCHDOG: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub debounce: Duration,
    pub alert_poll: Duration,
    pub watchdog: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce,
            alert_poll: ALERT_POLL_INTERVAL,
            watchdog: LOADING_WATCHDOG,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            alert_poll: ALERT_POLL_INTERVAL,
            watchdog: LOADING_WATCHDOG,
        }
    }
}

struct AlertPoller {
    location: Location,
    token: CancellationToken,
}

struct Inner {
    services: WeatherServices,
    settings: OrchestratorSettings,
    latest: AtomicU64,
    view: watch::Sender<WeatherView>,
    /// Parent of every task this orchestrator spawns
    session: CancellationToken,
    request: Mutex<CancellationToken>,
    poller: Mutex<Option<AlertPoller>>,
}

/// Owns one view and the background work feeding it. Dropping it tears
/// down every pending request and timer.
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(services: WeatherServices, settings: OrchestratorSettings) -> Self {
        let session = CancellationToken::new();
        let (view, _) = watch::channel(WeatherView::default());

        Self {
            inner: Arc::new(Inner {
                services,
                settings,
                latest: AtomicU64::new(0),
                view,
                request: Mutex::new(session.child_token()),
                session,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Start loading weather for `query`, superseding any pending request.
    ///
    /// Returns the request id immediately; progress is published through
    /// [`subscribe`](Self::subscribe).
    pub async fn on_location_change(&self, query: &str) -> Result<u64, WeatherError> {
        let query = normalize_query(query).ok_or(WeatherError::EmptyQuery)?;

        let token = self.inner.session.child_token();
        let request_id = {
            let mut current = self.inner.request.lock().await;
            current.cancel();
            *current = token.clone();
            self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1
        };

        tracing::debug!(request_id, query = %query, "Location change");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(request_id, "Request superseded");
                }
                _ = inner.run(request_id, query, token.clone()) => {}
            }
        });

        Ok(request_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherView> {
        self.inner.view.subscribe()
    }

    pub fn snapshot(&self) -> WeatherView {
        self.inner.view.borrow().clone()
    }

    /// Id of the most recently issued request.
    pub fn latest_request(&self) -> u64 {
        self.inner.latest.load(Ordering::SeqCst)
    }

    /// Cancel everything; later location changes are ignored.
    pub fn shutdown(&self) {
        self.inner.session.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.session.is_cancelled()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.inner.session.cancel();
    }
}

impl Inner {
    fn is_current(&self, request_id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == request_id
    }

    /// Apply `transition` only if `request_id` still owns the view.
    fn commit(&self, request_id: u64, transition: Transition) -> bool {
        let committed = self.view.send_if_modified(|view| {
            let owns = match &transition {
                Transition::Started { .. } => true,
                _ => view.request_id == request_id,
            };
            if !owns || !self.is_current(request_id) {
                return false;
            }
            view.apply(transition);
            true
        });
        if !committed {
            tracing::debug!(request_id, "Discarded stale result");
        }
        committed
    }

    /// Alerts are tied to a place, not a request.
    fn commit_alerts(&self, location: &Location, alerts: Vec<Alert>) -> bool {
        self.view.send_if_modified(|view| {
            let same = view
                .location
                .as_ref()
                .is_some_and(|current| current.same_place(location));
            if same {
                view.apply(Transition::AlertsLoaded(alerts));
            }
            same
        })
    }

    async fn run(self: &Arc<Self>, request_id: u64, query: String, token: CancellationToken) {
        tokio::time::sleep(self.settings.debounce).await;
        if !self.is_current(request_id) {
            return;
        }

        if !self.commit(
            request_id,
            Transition::Started {
                request_id,
                query: query.clone(),
            },
        ) {
            return;
        }

        let watchdog = token.child_token();
        let _watchdog_guard = watchdog.clone().drop_guard();
        self.spawn_watchdog(request_id, watchdog);

        let location = match self.services.geocoder.resolve(&query).await {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(request_id, query = %query, error = %e, "Geocoding failed");
                self.commit(request_id, Transition::GeocodeFailed(e));
                return;
            }
        };

        if !self.commit(request_id, Transition::Geocoded(location.clone())) {
            return;
        }
        self.restart_alert_poller(&location).await;

        let (forecast, sun_times) = tokio::join!(
            self.services.forecast.fetch(&location),
            self.services.sun_times.resolve(&location),
        );
        self.commit(request_id, Transition::SunTimesResolved(sun_times));

        let forecast = match forecast {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(request_id, label = %location.label, error = %e, "Forecast unavailable");
                self.commit(request_id, Transition::ForecastFailed(e));
                return;
            }
        };

        let current = forecast.current.clone();
        if !self.commit(request_id, Transition::ForecastLoaded(forecast)) {
            return;
        }

        let mut summary = self.services.summary.summarize(&current).await;
        if summary.is_empty() {
            summary = fallback_advisory(&current);
        }
        self.commit(request_id, Transition::SummaryReady(summary));
        tracing::info!(request_id, label = %location.label, "Weather settled");
    }

    fn spawn_watchdog(self: &Arc<Self>, request_id: u64, token: CancellationToken) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.settings.watchdog) => {
                    let fallback_summary = fallback_summary(&inner.view.borrow());
                    tracing::info!(request_id, "Loading watchdog expired");
                    inner.commit(request_id, Transition::WatchdogExpired { fallback_summary });
                }
            }
        });
    }

    /// Cancel the old poller and start a new one, unless already polling
    /// this place.
    async fn restart_alert_poller(self: &Arc<Self>, location: &Location) {
        let mut poller = self.poller.lock().await;
        if let Some(existing) = poller.as_ref() {
            if existing.location.same_place(location) && !existing.token.is_cancelled() {
                return;
            }
        }
        if let Some(old) = poller.take() {
            old.token.cancel();
        }

        let token = self.session.child_token();
        *poller = Some(AlertPoller {
            location: location.clone(),
            token: token.clone(),
        });

        let inner = Arc::clone(self);
        let location = location.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.settings.alert_poll);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let alerts = tokio::select! {
                    _ = token.cancelled() => break,
                    alerts = inner.services.alerts.fetch_active(&location) => alerts,
                };
                tracing::debug!(label = %location.label, count = alerts.len(), "Alerts polled");
                inner.commit_alerts(&location, alerts);
            }
            tracing::debug!(label = %location.label, "Alert poller stopped");
        });
    }
}

/// Summary shown when loading stalls: static advisory from whatever
/// conditions are displayed, else a time-of-day sentence.
fn fallback_summary(view: &WeatherView) -> String {
    if let Some(conditions) = &view.conditions {
        return fallback_advisory(conditions);
    }
    let daytime = view
        .sun_times
        .as_ref()
        .map(|s| {
            let now = Utc::now();
            s.sunrise <= now && now < s.sunset
        })
        .unwrap_or(true);
    default_sentence(daytime).to_string()
}

/// Run the pipeline once without a session, for one-shot requests.
///
/// Alerts are fetched once alongside the forecast instead of polled.
pub async fn load_once(services: &WeatherServices, query: &str) -> Result<WeatherView, WeatherError> {
    let query = normalize_query(query).ok_or(WeatherError::EmptyQuery)?;

    let mut view = WeatherView::default();
    view.apply(Transition::Started {
        request_id: 1,
        query: query.clone(),
    });

    let location = services.geocoder.resolve(&query).await?;
    view.apply(Transition::Geocoded(location.clone()));

    let (forecast, alerts, sun_times) = tokio::join!(
        services.forecast.fetch(&location),
        services.alerts.fetch_active(&location),
        services.sun_times.resolve(&location),
    );
    view.apply(Transition::AlertsLoaded(alerts));
    view.apply(Transition::SunTimesResolved(sun_times));

    match forecast {
        Ok(forecast) => {
            let current = forecast.current.clone();
            view.apply(Transition::ForecastLoaded(forecast));
            let mut summary = services.summary.summarize(&current).await;
            if summary.is_empty() {
                summary = fallback_advisory(&current);
            }
            view.apply(Transition::SummaryReady(summary));
        }
        Err(e) => {
            tracing::warn!(label = %location.label, error = %e, "Forecast unavailable");
            view.apply(Transition::ForecastFailed(e));
        }
    }

    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::view::Phase;

    fn offline() -> Orchestrator {
        let services = WeatherServices::from_config(&Config::test_default()).unwrap();
        Orchestrator::new(services, OrchestratorSettings::default())
    }

    #[tokio::test]
    async fn test_blank_query_rejected_without_request() {
        let orchestrator = offline();
        assert_eq!(
            orchestrator.on_location_change("   ").await,
            Err(WeatherError::EmptyQuery)
        );
        assert_eq!(orchestrator.latest_request(), 0);
        assert_eq!(orchestrator.snapshot().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let orchestrator = offline();
        let a = orchestrator.on_location_change("boston").await.unwrap();
        let b = orchestrator.on_location_change("chicago").await.unwrap();
        assert!(b > a);
        assert_eq!(orchestrator.latest_request(), b);
        orchestrator.shutdown();
        assert!(orchestrator.is_shut_down());
    }

    #[test]
    fn test_fallback_summary_without_conditions() {
        let view = WeatherView::default();
        assert_eq!(fallback_summary(&view), default_sentence(true));
    }
}

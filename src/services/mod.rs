// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod alerts;
pub mod cache;
pub mod email;
pub mod forecast;
pub mod geocoder;
pub mod orchestrator;
pub(crate) mod provider;
pub mod sessions;
pub mod subscription;
pub mod summary;
pub mod sun_times;
pub mod weather_gov;

pub use alerts::AlertFetcher;
pub use cache::{Lookup, TtlCache};
pub use email::EmailService;
pub use forecast::ForecastFetcher;
pub use geocoder::Geocoder;
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use sessions::SessionRegistry;
pub use subscription::SubscriptionService;
pub use summary::{GeminiClient, SummaryCache, SummaryGenerator, SummaryKey};
pub use sun_times::{SunTimesCache, SunTimesResolver};
pub use weather_gov::NwsClient;

use crate::config::Config;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often expired summary and sun-time entries are swept.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// The weather pipeline collaborators, shared by every orchestrator.
/// Cheap to clone; caches are shared between clones.
#[derive(Clone)]
pub struct WeatherServices {
    pub geocoder: Geocoder,
    pub forecast: ForecastFetcher,
    pub alerts: AlertFetcher,
    pub summary: SummaryGenerator,
    pub sun_times: SunTimesResolver,
}

impl WeatherServices {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let nws = NwsClient::new(&config.weather_api_url, &config.weather_user_agent)?;

        // Nominatim's usage policy also requires an identifying User-Agent
        let http = reqwest::Client::builder()
            .user_agent(config.weather_user_agent.as_str())
            .build()?;

        let geocoder = match &config.mapbox_token {
            Some(token) => Geocoder::mapbox(
                http.clone(),
                &config.mapbox_api_url,
                token,
                &config.geocoding_country,
            ),
            None => Geocoder::nominatim(
                http.clone(),
                &config.nominatim_api_url,
                &config.geocoding_country,
            ),
        };

        let gemini = config.gemini_api_key.as_deref().map(|key| {
            GeminiClient::new(
                http.clone(),
                &config.gemini_api_url,
                &config.gemini_model,
                key,
            )
        });
        if gemini.is_none() {
            tracing::info!("GEMINI_API_KEY not set, summaries use static advisories");
        }

        Ok(Self {
            geocoder,
            forecast: ForecastFetcher::new(nws.clone(), config.hourly_window),
            alerts: AlertFetcher::new(nws, config.alert_timeout),
            summary: SummaryGenerator::new(gemini, SummaryCache::new(summary::SUMMARY_TTL)),
            sun_times: SunTimesResolver::new(
                http,
                Some(&config.sun_times_api_url),
                SunTimesCache::new(sun_times::SUN_TIMES_TTL),
            ),
        })
    }

    /// Periodically evict expired summary and sun-times entries.
    pub fn spawn_cache_sweepers(
        &self,
        shutdown: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            self.summary
                .cache()
                .spawn_sweeper("summary", CACHE_SWEEP_INTERVAL, shutdown.clone()),
            self.sun_times
                .cache()
                .spawn_sweeper("sun_times", CACHE_SWEEP_INTERVAL, shutdown),
        ]
    }
}

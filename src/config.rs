// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Provider credentials are all optional: without them the service
//! degrades (Nominatim instead of Mapbox, static summaries instead of
//! Gemini, no e-mail, in-memory subscribers).

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Public URL of this service, used in e-mail links
    pub base_url: String,
    /// Frontend URL for CORS and redirects
    pub frontend_url: String,

    // --- Forecast provider ---
    pub weather_api_url: String,
    /// Descriptive client identifier sent on every weather.gov call
    pub weather_user_agent: String,
    /// Timeout for the active-alerts call
    pub alert_timeout: Duration,
    /// Number of hourly points in the view
    pub hourly_window: usize,

    // --- Geocoding ---
    pub mapbox_token: Option<String>,
    pub mapbox_api_url: String,
    pub nominatim_api_url: String,
    /// ISO country code geocoding is restricted to
    pub geocoding_country: String,

    // --- Generative summary ---
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_model: String,

    // --- Sun times ---
    pub sun_times_api_url: String,

    // --- E-mail ---
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub email_from: String,

    // --- Persistence ---
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,

    // --- Secrets ---
    /// HMAC key for unsubscribe tokens
    pub unsubscribe_secret: Vec<u8>,

    // --- Orchestration ---
    /// Location changes closer together than this collapse to the latest
    pub debounce: Duration,
    /// Sessions untouched for this long are dropped
    pub session_idle: Duration,
}

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.weather.gov";
pub const DEFAULT_USER_AGENT: &str = "LibertyWeather/0.1 (alerts@libertyweather.com)";
pub const DEFAULT_MAPBOX_API_URL: &str = "https://api.mapbox.com";
pub const DEFAULT_NOMINATIM_API_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SUN_TIMES_API_URL: &str = "https://api.sunrise-sunset.org";
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_EMAIL_FROM: &str = "Liberty Weather <alerts@libertyweather.com>";

/// Discard port on loopback; offline configs point every provider here.
const OFFLINE_API_URL: &str = "http://127.0.0.1:9";

const MIN_ALERT_TIMEOUT_SECS: u64 = 3;
const MAX_ALERT_TIMEOUT_SECS: u64 = 5;
const MIN_HOURLY_WINDOW: usize = 12;
const MAX_HOURLY_WINDOW: usize = 24;

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            weather_api_url: OFFLINE_API_URL.to_string(),
            weather_user_agent: DEFAULT_USER_AGENT.to_string(),
            alert_timeout: Duration::from_secs(MIN_ALERT_TIMEOUT_SECS),
            hourly_window: MIN_HOURLY_WINDOW,
            mapbox_token: None,
            mapbox_api_url: OFFLINE_API_URL.to_string(),
            nominatim_api_url: OFFLINE_API_URL.to_string(),
            geocoding_country: "US".to_string(),
            gemini_api_key: None,
            gemini_api_url: OFFLINE_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            sun_times_api_url: OFFLINE_API_URL.to_string(),
            resend_api_key: None,
            resend_api_url: OFFLINE_API_URL.to_string(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            supabase_url: None,
            supabase_key: None,
            unsubscribe_secret: b"test_unsubscribe_secret".to_vec(),
            debounce: Duration::from_millis(500),
            session_idle: Duration::from_secs(30 * 60),
        }
    }
}

impl Config {
    /// Offline configuration for tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let alert_timeout_secs = parse_or("ALERT_TIMEOUT_SECS", MIN_ALERT_TIMEOUT_SECS)
            .clamp(MIN_ALERT_TIMEOUT_SECS, MAX_ALERT_TIMEOUT_SECS);
        let hourly_window =
            parse_or("HOURLY_WINDOW", MIN_HOURLY_WINDOW).clamp(MIN_HOURLY_WINDOW, MAX_HOURLY_WINDOW);

        Ok(Self {
            port: parse_or("PORT", 8080),
            base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string()),
            weather_user_agent: env::var("WEATHER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            alert_timeout: Duration::from_secs(alert_timeout_secs),
            hourly_window,

            mapbox_token: optional("MAPBOX_TOKEN"),
            mapbox_api_url: env::var("MAPBOX_API_URL")
                .unwrap_or_else(|_| DEFAULT_MAPBOX_API_URL.to_string()),
            nominatim_api_url: env::var("NOMINATIM_API_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_API_URL.to_string()),
            geocoding_country: env::var("GEOCODING_COUNTRY").unwrap_or_else(|_| "US".to_string()),

            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),

            sun_times_api_url: env::var("SUN_TIMES_API_URL")
                .unwrap_or_else(|_| DEFAULT_SUN_TIMES_API_URL.to_string()),

            resend_api_key: optional("RESEND_API_KEY"),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| DEFAULT_RESEND_API_URL.to_string()),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),

            supabase_url: optional("SUPABASE_URL"),
            supabase_key: optional("SUPABASE_KEY"),

            unsubscribe_secret: required("UNSUBSCRIBE_SECRET")?.into_bytes(),

            debounce: Duration::from_millis(parse_or("DEBOUNCE_MS", 500)),
            session_idle: Duration::from_secs(parse_or("SESSION_IDLE_MINUTES", 30u64) * 60),
        })
    }
}

/// Read an optional variable, treating blank values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a required variable; blank counts as missing.
fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Two layers:
//! - [`WeatherError`] classifies failures inside the weather pipeline
//!   (geocoding, forecast, alerts, summary).
//! - [`AppError`] is what HTTP handlers return; it renders as JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure classes of the weather pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    #[error("Location query must not be empty")]
    EmptyQuery,

    /// Geocoding returned no results. User-correctable, never retried.
    #[error("No location found for '{0}'")]
    NotFound(String),

    /// The forecast chain (point metadata or hourly series) failed.
    #[error("Forecast unavailable: {0}")]
    Unavailable(String),

    /// Live station reading missing; callers fall back to the forecast.
    #[error("Live observation unavailable: {0}")]
    DegradedObservation(String),

    #[error("Rate limited by {0}")]
    RateLimited(&'static str),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Alert fetch failed: {0}")]
    AlertFetch(String),
}

impl WeatherError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, WeatherError::RateLimited(_))
    }
}

/// Degrade a best-effort step to `None`, logging why.
///
/// Every fallback chain in the pipeline goes through this so the policy
/// for a given step is visible at the call site.
pub trait Degrade<T> {
    fn or_degrade(self, stage: &'static str) -> Option<T>;
}

impl<T> Degrade<T> for std::result::Result<T, WeatherError> {
    fn or_degrade(self, stage: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(stage, error = %e, "Degrading to fallback");
                None
            }
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Weather provider error: {0}")]
    WeatherApi(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::EmptyQuery => AppError::BadRequest(err.to_string()),
            WeatherError::NotFound(_) => AppError::NotFound(err.to_string()),
            WeatherError::Unavailable(_) => AppError::Unavailable(err.to_string()),
            WeatherError::DegradedObservation(_)
            | WeatherError::RateLimited(_)
            | WeatherError::Provider(_)
            | WeatherError::AlertFetch(_) => AppError::WeatherApi(err.to_string()),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::WeatherApi(msg) => {
                tracing::warn!(error = %msg, "Weather provider error");
                (StatusCode::BAD_GATEWAY, "weather_provider_error", None)
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                Some(msg.clone()),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Email(msg) => {
                tracing::error!(error = %msg, "Email error");
                (StatusCode::INTERNAL_SERVER_ERROR, "email_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response checking shared by the external provider clients.

use crate::error::WeatherError;
use serde::de::DeserializeOwned;

/// Check response status and parse the JSON body.
///
/// `provider` names the upstream in logs and in `RateLimited`.
pub(crate) async fn check_response_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, WeatherError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!(provider, "Provider rate limit hit (429)");
            return Err(WeatherError::RateLimited(provider));
        }

        return Err(WeatherError::Provider(format!(
            "{provider} HTTP {status}: {}",
            truncate(&body, 200)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| WeatherError::Provider(format!("{provider} JSON parse error: {e}")))
}

/// Map a transport-level failure (connect, timeout) to a provider error.
pub(crate) fn transport_error(provider: &'static str, err: reqwest::Error) -> WeatherError {
    WeatherError::Provider(format!("{provider} request failed: {err}"))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active alert fetching. Never fails upward: errors and timeouts yield
//! an empty list.

use crate::error::{Degrade, WeatherError};
use crate::models::alert::{Alert, Severity};
use crate::models::location::Location;
use crate::services::weather_gov::{AlertProperties, NwsClient};
use crate::time_utils::parse_rfc3339;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Clone)]
pub struct AlertFetcher {
    nws: NwsClient,
    timeout: Duration,
}

impl AlertFetcher {
    pub fn new(nws: NwsClient, timeout: Duration) -> Self {
        Self { nws, timeout }
    }

    /// Active alerts for a location, most severe first.
    pub async fn fetch_active(&self, location: &Location) -> Vec<Alert> {
        let result = tokio::time::timeout(
            self.timeout,
            self.nws.active_alerts(location.latitude, location.longitude),
        )
        .await
        .unwrap_or_else(|_| {
            Err(WeatherError::AlertFetch(format!(
                "timed out after {:?}",
                self.timeout
            )))
        });

        if let Err(e) = &result {
            tracing::warn!(label = %location.label, error = %e, "Alert fetch failed");
        }

        result
            .or_degrade("alerts")
            .map(|raw| normalize_alerts(raw, Utc::now()))
            .unwrap_or_default()
    }
}

/// Convert provider alerts and sort them by severity rank.
///
/// The sort is stable: alerts of equal severity keep provider order.
/// Missing timestamps fall back (effective → onset → sent → `now`,
/// expires → ends → effective).
pub fn normalize_alerts(raw: Vec<AlertProperties>, now: DateTime<Utc>) -> Vec<Alert> {
    let mut ranked: Vec<(u8, Alert)> = raw
        .into_iter()
        .map(|p| {
            let rank = Severity::rank_of(p.severity.as_deref());
            (rank, to_alert(p, now))
        })
        .collect();

    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, alert)| alert).collect()
}

fn to_alert(p: AlertProperties, now: DateTime<Utc>) -> Alert {
    let parse = |raw: &Option<String>| {
        raw.as_deref()
            .and_then(parse_rfc3339)
            .map(|d| d.with_timezone(&Utc))
    };

    let effective_at = parse(&p.effective)
        .or_else(|| parse(&p.onset))
        .or_else(|| parse(&p.sent))
        .unwrap_or(now);
    let expires_at = parse(&p.expires)
        .or_else(|| parse(&p.ends))
        .unwrap_or(effective_at);

    let event = p.event.unwrap_or_default();
    Alert {
        id: p.id.unwrap_or_default(),
        headline: p.headline.unwrap_or_else(|| event.clone()),
        event,
        description: p.description.unwrap_or_default(),
        instruction: p.instruction.filter(|s| !s.trim().is_empty()),
        effective_at,
        expires_at,
        severity: Severity::parse(p.severity.as_deref()),
        urgency: p.urgency.unwrap_or_else(|| "Unknown".to_string()),
        certainty: p.certainty.unwrap_or_else(|| "Unknown".to_string()),
        area_description: p.area_desc,
    }
}

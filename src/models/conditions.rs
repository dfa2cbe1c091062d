// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current conditions and hourly forecast models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Conditions for "now", merged from the matched forecast period and the
/// nearest station's latest observation. Replaced wholesale on every
/// successful forecast fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentConditions {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub temperature_celsius: i64,
    pub short_description: String,
    pub detailed_description: String,
    /// Provider wind string, e.g. "10 mph"
    pub wind_speed: String,
    pub wind_direction: String,
    /// Provider icon URL
    pub icon_ref: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub observed_at: DateTime<Utc>,
    pub is_daytime: bool,
}

/// One point of the hourly strip. Index 0 is always "Now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HourlyPoint {
    pub label: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub temperature_celsius: i64,
    pub short_description: String,
    pub icon_kind: IconKind,
}

/// Icon family for an hourly point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IconKind {
    Sun,
    Cloud,
    Rain,
    Drizzle,
    Snow,
    Thunderstorm,
    Fog,
    Default,
}

/// Substring rules, checked in order; the first match wins.
const ICON_RULES: &[(&[&str], IconKind)] = &[
    (&["thunder", "storm"], IconKind::Thunderstorm),
    (&["rain", "shower"], IconKind::Rain),
    (&["snow", "sleet", "hail"], IconKind::Snow),
    (&["drizzle"], IconKind::Drizzle),
    (&["fog", "mist", "haze"], IconKind::Fog),
    (&["overcast", "cloud"], IconKind::Cloud),
    (&["sun", "clear"], IconKind::Sun),
];

impl IconKind {
    /// Map a free-text forecast description to an icon, case-insensitively.
    pub fn from_description(description: &str) -> Self {
        let text = description.to_lowercase();
        ICON_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| text.contains(n)))
            .map(|(_, kind)| *kind)
            .unwrap_or(IconKind::Default)
    }
}

/// Result of one successful forecast fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
}

/// Round half up, matching how the site has always rounded temperatures.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Fahrenheit to Celsius, rounded to the nearest integer.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i64 {
    round_half_up((fahrenheit - 32.0) * 5.0 / 9.0)
}

const PLACEHOLDER_LABELS: [&str; 12] = [
    "Now", "1 PM", "2 PM", "3 PM", "4 PM", "5 PM", "6 PM", "7 PM", "8 PM", "9 PM", "10 PM", "11 PM",
];
const PLACEHOLDER_TEMPS: [i64; 12] = [22, 21, 20, 19, 18, 17, 16, 15, 14, 15, 16, 17];
const PLACEHOLDER_ICONS: [IconKind; 12] = [
    IconKind::Sun,
    IconKind::Cloud,
    IconKind::Rain,
    IconKind::Cloud,
    IconKind::Default,
    IconKind::Cloud,
    IconKind::Fog,
    IconKind::Default,
    IconKind::Cloud,
    IconKind::Sun,
    IconKind::Cloud,
    IconKind::Default,
];

/// Fixed series shown while loading or when a forecast failed and there
/// is nothing to retain. Never shown as an empty strip.
pub fn placeholder_hourly() -> Vec<HourlyPoint> {
    PLACEHOLDER_LABELS
        .iter()
        .zip(PLACEHOLDER_TEMPS)
        .zip(PLACEHOLDER_ICONS)
        .map(|((label, temperature_celsius), icon_kind)| HourlyPoint {
            label: label.to_string(),
            temperature_celsius,
            short_description: String::new(),
            icon_kind,
        })
        .collect()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation hints derived from conditions: mascot outfit, background
//! animation and colours. Pure functions, no I/O.

use crate::models::alert::{Alert, Severity};
use crate::models::conditions::CurrentConditions;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MascotOutfit {
    Summer,
    Spring,
    Fall,
    Winter,
    Default,
}

impl MascotOutfit {
    pub fn for_temperature(celsius: i64) -> Self {
        match celsius {
            t if t >= 27 => MascotOutfit::Summer,
            t if t >= 16 => MascotOutfit::Spring,
            t if t >= 4 => MascotOutfit::Fall,
            _ => MascotOutfit::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Animation {
    Sunny,
    Clear,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Default,
}

impl Animation {
    pub fn for_description(description: &str) -> Self {
        let text = description.to_lowercase();
        if text.contains("thunder") || text.contains("storm") {
            Animation::Stormy
        } else if text.contains("sun") {
            Animation::Sunny
        } else if text.contains("clear") {
            Animation::Clear
        } else if text.contains("cloud") || text.contains("overcast") {
            Animation::Cloudy
        } else if text.contains("rain") || text.contains("shower") || text.contains("drizzle") {
            Animation::Rainy
        } else if text.contains("snow") || text.contains("hail") || text.contains("sleet") {
            Animation::Snowy
        } else {
            Animation::Default
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            Animation::Sunny => "#e2ab2c",
            Animation::Clear => "rgb(18 45 90)",
            Animation::Cloudy => "rgb(60 65 75)",
            Animation::Rainy => "rgb(16 40 70)",
            Animation::Snowy => "rgb(40 60 80)",
            Animation::Stormy => "rgb(35 30 60)",
            Animation::Default => "rgb(18 45 90)",
        }
    }
}

impl Severity {
    pub fn color(self) -> &'static str {
        match self {
            Severity::Extreme => "#e74c3c",
            Severity::Severe => "#e67e22",
            Severity::Moderate => "#f1c40f",
            Severity::Minor => "#3498db",
            Severity::Unknown => "#95a5a6",
        }
    }
}

/// Everything the page needs to pick its look.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Theme {
    pub outfit: MascotOutfit,
    pub animation: Animation,
    pub background: String,
    /// Colour of the most severe active alert, if any.
    pub alert_color: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            outfit: MascotOutfit::Default,
            animation: Animation::Default,
            background: Animation::Default.background().to_string(),
            alert_color: None,
        }
    }
}

impl Theme {
    /// Alerts are expected in severity order, so the first one decides.
    pub fn derive(conditions: Option<&CurrentConditions>, alerts: &[Alert]) -> Self {
        let (outfit, animation) = match conditions {
            Some(c) => (
                MascotOutfit::for_temperature(c.temperature_celsius),
                Animation::for_description(&c.short_description),
            ),
            None => (MascotOutfit::Default, Animation::Default),
        };

        Self {
            outfit,
            animation,
            background: animation.background().to_string(),
            alert_color: alerts.first().map(|a| a.severity.color().to_string()),
        }
    }
}

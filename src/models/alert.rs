// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active severe-weather alert model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Rank given to severities the provider sends that we don't recognize.
pub const UNMAPPED_SEVERITY_RANK: u8 = 6;

/// Provider severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl Severity {
    /// Parse a provider severity string. Anything unrecognized is `Unknown`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("Extreme") => Severity::Extreme,
            Some("Severe") => Severity::Severe,
            Some("Moderate") => Severity::Moderate,
            Some("Minor") => Severity::Minor,
            _ => Severity::Unknown,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Severity::Extreme => 1,
            Severity::Severe => 2,
            Severity::Moderate => 3,
            Severity::Minor => 4,
            Severity::Unknown => 5,
        }
    }

    /// Sort rank for a raw provider value. An explicit "Unknown" ranks
    /// ahead of values we can't map at all.
    pub fn rank_of(raw: Option<&str>) -> u8 {
        match raw {
            Some("Unknown") => Severity::Unknown.rank(),
            other => match Severity::parse(other) {
                Severity::Unknown => UNMAPPED_SEVERITY_RANK,
                known => known.rank(),
            },
        }
    }

    pub fn is_severe(self) -> bool {
        matches!(self, Severity::Extreme | Severity::Severe)
    }
}

/// A normalized active alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Alert {
    pub id: String,
    pub event: String,
    pub headline: String,
    pub description: String,
    pub instruction: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub effective_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub expires_at: DateTime<Utc>,
    pub severity: Severity,
    pub urgency: String,
    pub certainty: String,
    pub area_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        let ranks: Vec<u8> = ["Extreme", "Severe", "Moderate", "Minor", "Unknown", "Bogus"]
            .iter()
            .map(|s| Severity::rank_of(Some(s)))
            .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(Severity::rank_of(None), UNMAPPED_SEVERITY_RANK);
    }

    #[test]
    fn test_parse_is_case_sensitive_like_provider() {
        assert_eq!(Severity::parse(Some("Severe")), Severity::Severe);
        assert_eq!(Severity::parse(Some("severe")), Severity::Unknown);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert subscriber model for storage.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Coordinates a subscriber wants alerts for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
}

/// Subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Cancelled,
}

/// Row in the `subscribers` table. E-mail is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub location: GeoPoint,
    pub unsubscribe_token: String,
    pub status: SubscriberStatus,
    /// When the subscriber first signed up (ISO 8601)
    pub created_at: String,
    /// Last change (ISO 8601)
    pub updated_at: String,
    /// Set when the subscriber unsubscribes (ISO 8601)
    #[serde(default)]
    pub cancelled_at: Option<String>,
}

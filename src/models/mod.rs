// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod alert;
pub mod conditions;
pub mod location;
pub mod subscriber;
pub mod sun;
pub mod theme;
pub mod view;

pub use alert::{Alert, Severity};
pub use conditions::{CurrentConditions, Forecast, HourlyPoint, IconKind};
pub use location::Location;
pub use subscriber::{GeoPoint, Subscriber, SubscriberStatus};
pub use sun::{SunSource, SunTimes};
pub use theme::{Animation, MascotOutfit, Theme};
pub use view::{Phase, StageState, Stages, Transition, ViewError, WeatherView};

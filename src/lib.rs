// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Liberty Weather: US weather lookups with severe-weather alerts.
//!
//! This crate provides the backend for the weather site: geocoding,
//! forecasts and alerts from the National Weather Service, generated
//! summaries, and the per-session orchestration that keeps the displayed
//! view consistent while the user types.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SupabaseDb;
use services::{
    EmailService, OrchestratorSettings, SessionRegistry, SubscriptionService, WeatherServices,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SupabaseDb,
    pub weather: WeatherServices,
    pub sessions: SessionRegistry,
    pub subscriptions: SubscriptionService,
}

impl AppState {
    /// Wire up every service from `config`, storing subscribers in `db`.
    pub fn new(config: Config, db: SupabaseDb) -> anyhow::Result<Self> {
        let weather = WeatherServices::from_config(&config)?;
        let sessions = SessionRegistry::new(
            weather.clone(),
            OrchestratorSettings::from_config(&config),
            config.session_idle,
        );
        let subscriptions = SubscriptionService::new(
            db.clone(),
            EmailService::new(&config),
            config.unsubscribe_secret.clone(),
        );

        Ok(Self {
            config,
            db,
            weather,
            sessions,
            subscriptions,
        })
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot weather lookup, used to server-render `/weather/[city]`.

use crate::error::Result;
use crate::models::view::WeatherView;
use crate::services::orchestrator::load_once;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/weather", get(get_weather))
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub city: String,
}

/// Run the full pipeline for `city` and return the settled view.
///
/// An unknown city is a 404. A forecast outage still returns 200 with the
/// forecast stage marked failed.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherView>> {
    let view = load_once(&state.weather, &params.city).await?;
    Ok(Json(view))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive sessions: each one owns an orchestrator whose view the
//! client polls while typing locations.

use crate::error::{AppError, Result};
use crate::models::view::WeatherView;
use crate::services::Orchestrator;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/location", post(change_location))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationRequest {
    pub query: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationAccepted {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub request_id: u64,
}

fn lookup(state: &AppState, id: &str) -> Result<Arc<Orchestrator>> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let session_id = state.sessions.create()?;
    Ok((StatusCode::CREATED, Json(SessionResponse { session_id })))
}

/// Queue a location change. Loading continues in the background.
async fn change_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<LocationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LocationAccepted>)> {
    let orchestrator = lookup(&state, &id)?;
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let request_id = orchestrator.on_location_change(&request.query).await?;
    Ok((StatusCode::ACCEPTED, Json(LocationAccepted { request_id })))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WeatherView>> {
    Ok(Json(lookup(&state, &id)?.snapshot()))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.sessions.remove(&id) {
        return Err(AppError::NotFound(format!("Session {} not found", id)));
    }
    tracing::debug!(sessions = state.sessions.len(), "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

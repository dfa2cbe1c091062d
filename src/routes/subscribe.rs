// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Severe-weather alert subscriptions.

use crate::error::{AppError, Result};
use crate::models::subscriber::GeoPoint;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/subscribe", post(subscribe))
        .route("/api/unsubscribe", get(unsubscribe))
}

// ─── Subscribe ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
    #[validate(nested)]
    pub location: GeoPoint,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub email_sent: bool,
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>> {
    let Json(mut request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request.email = request.email.trim().to_string();
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid subscription: {}", e)))?;

    let outcome = state
        .subscriptions
        .subscribe(&request.email, request.location)
        .await?;

    let message = if outcome.updated {
        "Subscription updated"
    } else {
        "Subscribed to severe weather alerts"
    };
    Ok(Json(SubscribeResponse {
        success: true,
        message: message.to_string(),
        email_sent: outcome.email_sent,
    }))
}

// ─── Unsubscribe ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
    pub token: Option<String>,
    pub email: Option<String>,
}

/// Link target from alert e-mails. Redirects to the frontend on success.
async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UnsubscribeParams>,
) -> Result<Redirect> {
    let (Some(token), Some(email)) = (params.token, params.email) else {
        return Err(AppError::BadRequest("Missing token or email".to_string()));
    };

    state.subscriptions.unsubscribe(&email, &token).await?;

    Ok(Redirect::to(&format!(
        "{}/unsubscribe/success",
        state.config.frontend_url.trim_end_matches('/')
    )))
}

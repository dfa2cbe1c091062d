// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscriber storage.
//!
//! Talks PostgREST to a hosted Supabase `subscribers` table. Without a
//! Supabase URL, subscribers live in memory for the life of the process.

use crate::db::tables;
use crate::error::AppError;
use crate::models::subscriber::{GeoPoint, Subscriber, SubscriberStatus};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Rest {
        http: reqwest::Client,
        base_url: String,
        api_key: String,
    },
    Memory(Arc<DashMap<String, Subscriber>>),
    Offline,
}

/// Subscriber database client.
#[derive(Clone)]
pub struct SupabaseDb {
    backend: Backend,
}

impl SupabaseDb {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        tracing::info!(url = base_url, "Using Supabase subscriber store");
        Self {
            backend: Backend::Rest {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
            },
        }
    }

    /// Process-local store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn table_url(base_url: &str) -> String {
        format!("{}/rest/v1/{}", base_url, tables::SUBSCRIBERS)
    }

    // ─── Subscriber Operations ───────────────────────────────────

    /// Get a subscriber by e-mail.
    pub async fn get_subscriber(&self, email: &str) -> Result<Option<Subscriber>, AppError> {
        match &self.backend {
            Backend::Rest {
                http,
                base_url,
                api_key,
            } => {
                let response = http
                    .get(Self::table_url(base_url))
                    .header("apikey", api_key)
                    .bearer_auth(api_key)
                    .query(&[("email", format!("eq.{email}")), ("select", "*".to_string())])
                    .send()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                let rows: Vec<Subscriber> = check_response_json(response).await?;
                Ok(rows.into_iter().next())
            }
            Backend::Memory(rows) => Ok(rows.get(email).map(|row| row.value().clone())),
            Backend::Offline => Err(offline()),
        }
    }

    /// Insert a new subscriber. The e-mail must not exist yet.
    pub async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), AppError> {
        match &self.backend {
            Backend::Rest {
                http,
                base_url,
                api_key,
            } => {
                let response = http
                    .post(Self::table_url(base_url))
                    .header("apikey", api_key)
                    .header("Prefer", "return=minimal")
                    .bearer_auth(api_key)
                    .json(&[subscriber])
                    .send()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                check_response(response).await
            }
            Backend::Memory(rows) => match rows.entry(subscriber.email.clone()) {
                Entry::Occupied(_) => Err(AppError::Database(format!(
                    "Subscriber {} already exists",
                    subscriber.email
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(subscriber.clone());
                    Ok(())
                }
            },
            Backend::Offline => Err(offline()),
        }
    }

    /// Re-activate an existing subscriber with a new location and token.
    pub async fn update_subscription(
        &self,
        email: &str,
        location: GeoPoint,
        unsubscribe_token: &str,
        updated_at: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Rest { .. } => {
                let body = serde_json::json!({
                    "location": location,
                    "unsubscribe_token": unsubscribe_token,
                    "status": SubscriberStatus::Active,
                    "updated_at": updated_at,
                    "cancelled_at": null,
                });
                self.patch(email, body).await
            }
            Backend::Memory(rows) => {
                let mut row = rows
                    .get_mut(email)
                    .ok_or_else(|| AppError::Database(format!("No subscriber {email}")))?;
                row.location = location;
                row.unsubscribe_token = unsubscribe_token.to_string();
                row.status = SubscriberStatus::Active;
                row.updated_at = updated_at.to_string();
                row.cancelled_at = None;
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Mark a subscriber as cancelled.
    pub async fn cancel_subscription(&self, email: &str, cancelled_at: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Rest { .. } => {
                let body = serde_json::json!({
                    "status": SubscriberStatus::Cancelled,
                    "updated_at": cancelled_at,
                    "cancelled_at": cancelled_at,
                });
                self.patch(email, body).await
            }
            Backend::Memory(rows) => {
                let mut row = rows
                    .get_mut(email)
                    .ok_or_else(|| AppError::Database(format!("No subscriber {email}")))?;
                row.status = SubscriberStatus::Cancelled;
                row.updated_at = cancelled_at.to_string();
                row.cancelled_at = Some(cancelled_at.to_string());
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    async fn patch(&self, email: &str, body: serde_json::Value) -> Result<(), AppError> {
        let Backend::Rest {
            http,
            base_url,
            api_key,
        } = &self.backend
        else {
            return Err(offline());
        };

        let response = http
            .patch(Self::table_url(base_url))
            .header("apikey", api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(api_key)
            .query(&[("email", format!("eq.{email}"))])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_response(response).await
    }
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Database(format!("HTTP {}: {}", status, body)))
}

async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Database(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert subscriptions: upsert by e-mail, token-checked unsubscribe.

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::subscriber::{GeoPoint, Subscriber, SubscriberStatus};
use crate::services::email::EmailService;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of a subscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOutcome {
    /// True if the e-mail was already known and got re-activated
    pub updated: bool,
    pub email_sent: bool,
}

#[derive(Clone)]
pub struct SubscriptionService {
    db: SupabaseDb,
    email: EmailService,
    secret: Vec<u8>,
}

impl SubscriptionService {
    pub fn new(db: SupabaseDb, email: EmailService, secret: Vec<u8>) -> Self {
        Self { db, email, secret }
    }

    /// Insert or re-activate a subscriber, then try to send a welcome
    /// e-mail. Only storage failures are errors.
    pub async fn subscribe(
        &self,
        email: &str,
        location: GeoPoint,
    ) -> Result<SubscribeOutcome, AppError> {
        let now = Utc::now();
        let token = unsubscribe_token(&self.secret, email, now)?;
        let timestamp = format_utc_rfc3339(now);

        let updated = match self.db.get_subscriber(email).await? {
            Some(_) => {
                self.db
                    .update_subscription(email, location, &token, &timestamp)
                    .await?;
                true
            }
            None => {
                self.db
                    .insert_subscriber(&Subscriber {
                        email: email.to_string(),
                        location,
                        unsubscribe_token: token.clone(),
                        status: SubscriberStatus::Active,
                        created_at: timestamp.clone(),
                        updated_at: timestamp,
                        cancelled_at: None,
                    })
                    .await?;
                false
            }
        };
        tracing::info!(updated, "Subscriber saved");

        let email_sent = match self.email.send_welcome(email, location, &token).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send welcome email");
                false
            }
        };

        Ok(SubscribeOutcome {
            updated,
            email_sent,
        })
    }

    /// Cancel the subscription matching both e-mail and token.
    pub async fn unsubscribe(&self, email: &str, token: &str) -> Result<(), AppError> {
        let subscriber = self
            .db
            .get_subscriber(email)
            .await?
            .filter(|s| tokens_match(&s.unsubscribe_token, token))
            .ok_or_else(|| AppError::BadRequest("Invalid unsubscribe link".to_string()))?;

        self.db
            .cancel_subscription(&subscriber.email, &format_utc_rfc3339(Utc::now()))
            .await?;
        tracing::info!("Subscriber cancelled");

        if let Err(e) = self.email.send_unsubscribe_confirmation(email).await {
            tracing::warn!(error = %e, "Failed to send unsubscribe confirmation");
        }
        Ok(())
    }
}

/// HMAC-SHA256 over the e-mail followed by the millisecond timestamp,
/// hex encoded.
pub fn unsubscribe_token(secret: &[u8], email: &str, at: DateTime<Utc>) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(email.as_bytes());
    mac.update(at.timestamp_millis().to_string().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn tokens_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn service(db: SupabaseDb) -> SubscriptionService {
        let config = Config::test_default();
        SubscriptionService::new(db, EmailService::new(&config), config.unsubscribe_secret)
    }

    fn boston() -> GeoPoint {
        GeoPoint {
            lat: 42.36,
            lon: -71.06,
        }
    }

    #[test]
    fn test_token_depends_on_time_and_email() {
        let t0 = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let t1 = DateTime::from_timestamp_millis(1_700_000_000_001).unwrap();

        let a = unsubscribe_token(b"secret", "a@b.co", t0).unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, unsubscribe_token(b"secret", "a@b.co", t0).unwrap());
        assert_ne!(a, unsubscribe_token(b"secret", "a@b.co", t1).unwrap());
        assert_ne!(a, unsubscribe_token(b"secret", "c@d.co", t0).unwrap());
        assert_ne!(a, unsubscribe_token(b"other", "a@b.co", t0).unwrap());
    }

    #[tokio::test]
    async fn test_subscribe_then_resubscribe() {
        let db = SupabaseDb::new_in_memory();
        let service = service(db.clone());

        let first = service.subscribe("a@b.co", boston()).await.unwrap();
        assert!(!first.updated);
        // No Resend key in tests
        assert!(!first.email_sent);

        let second = service.subscribe("a@b.co", GeoPoint { lat: 1.0, lon: 2.0 }).await.unwrap();
        assert!(second.updated);
        let row = db.get_subscriber("a@b.co").await.unwrap().unwrap();
        assert_eq!(row.location, GeoPoint { lat: 1.0, lon: 2.0 });
    }

    #[tokio::test]
    async fn test_unsubscribe_requires_matching_token() {
        let db = SupabaseDb::new_in_memory();
        let service = service(db.clone());
        service.subscribe("a@b.co", boston()).await.unwrap();
        let token = db.get_subscriber("a@b.co").await.unwrap().unwrap().unsubscribe_token;

        let err = service.unsubscribe("a@b.co", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = service.unsubscribe("nobody@b.co", &token).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        service.unsubscribe("a@b.co", &token).await.unwrap();
        let row = db.get_subscriber("a@b.co").await.unwrap().unwrap();
        assert_eq!(row.status, SubscriberStatus::Cancelled);
        assert!(row.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_is_error() {
        let service = service(SupabaseDb::new_mock());
        let err = service.subscribe("a@b.co", boston()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}

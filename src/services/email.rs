// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional e-mail via Resend.
//!
//! Sending is best-effort everywhere it's used: callers log failures and
//! carry on.

use crate::config::Config;
use crate::error::AppError;
use crate::models::subscriber::GeoPoint;
use chrono::{Datelike, Utc};
use serde::Serialize;

/// Resend client plus the templates we send.
#[derive(Clone)]
pub struct EmailService {
    http: reqwest::Client,
    api_url: String,
    /// `None` disables sending
    api_key: Option<String>,
    from: String,
    /// Public URL used in links
    base_url: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl EmailService {
    pub fn new(config: &Config) -> Self {
        if config.resend_api_key.is_none() {
            tracing::warn!("RESEND_API_KEY not configured, e-mails will not be sent");
        }
        Self {
            http: reqwest::Client::new(),
            api_url: config.resend_api_url.trim_end_matches('/').to_string(),
            api_key: config.resend_api_key.clone(),
            from: config.email_from.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

        let response = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(subject, "Email sent");
        Ok(())
    }

    pub async fn send_welcome(
        &self,
        email: &str,
        location: GeoPoint,
        unsubscribe_token: &str,
    ) -> Result<(), AppError> {
        let html = welcome_html(
            &self.base_url,
            location,
            &self.unsubscribe_url(email, unsubscribe_token),
        );
        self.send(email, "Welcome to Weather Alerts!", &html).await
    }

    pub async fn send_unsubscribe_confirmation(&self, email: &str) -> Result<(), AppError> {
        let html = unsubscribe_html(&self.base_url, email);
        self.send(email, "Unsubscribed from Weather Alerts", &html)
            .await
    }

    pub fn unsubscribe_url(&self, email: &str, unsubscribe_token: &str) -> String {
        format!(
            "{}/api/unsubscribe?token={}&email={}",
            self.base_url,
            urlencoding::encode(unsubscribe_token),
            urlencoding::encode(email)
        )
    }
}

const STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { color: white; padding: 40px 20px; text-align: center; border-radius: 10px 10px 0 0; }
.content { background: white; padding: 30px; border-radius: 0 0 10px 10px; }
.box { background: #fff3cd; border: 1px solid #ffeaa7; border-radius: 8px; padding: 20px; margin: 20px 0; }
.badge { display: inline-block; background: #f1f3f9; padding: 8px 16px; border-radius: 20px; font-family: monospace; }
.footer { text-align: center; margin-top: 30px; color: #666; font-size: 12px; }";

/// Welcome e-mail body.
pub fn welcome_html(base_url: &str, location: GeoPoint, unsubscribe_url: &str) -> String {
    let year = Utc::now().year();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Welcome to Weather Alerts</title><style>{STYLE}</style></head>
<body>
<div class="container">
  <div class="header" style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);">
    <h1>Weather Alerts</h1>
    <p>Stay safe with real-time weather notifications</p>
  </div>
  <div class="content">
    <h2>Welcome aboard!</h2>
    <p>You've subscribed to <strong>Liberty Weather Alerts</strong>. We'll notify you when severe weather threatens your area.</p>
    <div class="box">
      <h3>Your Alert Location</h3>
      <div class="badge">{lat:.4}, {lon:.4}</div>
    </div>
    <div class="box">
      <p><strong>Our alerts supplement official warnings. Always follow instructions from local authorities during emergencies.</strong></p>
    </div>
    <p><a href="{base_url}">View Current Alerts</a></p>
    <p><a href="{unsubscribe_url}" style="color: #e74c3c;">Unsubscribe from all alerts</a></p>
  </div>
  <div class="footer"><p>Liberty Weather Alerts &copy; {year}</p></div>
</div>
</body>
</html>"#,
        lat = location.lat,
        lon = location.lon,
        base_url = html_escape(base_url),
        unsubscribe_url = html_escape(unsubscribe_url),
    )
}

/// Unsubscribe confirmation body.
pub fn unsubscribe_html(base_url: &str, email: &str) -> String {
    let year = Utc::now().year();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Unsubscribed from Weather Alerts</title><style>{STYLE}</style></head>
<body>
<div class="container">
  <div class="header" style="background: linear-gradient(135deg, #95a5a6 0%, #7f8c8d 100%);">
    <h1>Unsubscribed</h1>
  </div>
  <div class="content">
    <h2>We're sorry to see you go</h2>
    <p>You've unsubscribed from <strong>Liberty Weather Alerts</strong>.</p>
    <p><strong>Email:</strong> {email}</p>
    <p>You will no longer receive severe weather alerts for your location.</p>
    <p><a href="{base_url}">Resubscribe to Alerts</a></p>
  </div>
  <div class="footer"><p>Liberty Weather Alerts &copy; {year}</p></div>
</div>
</body>
</html>"#,
        email = html_escape(email),
        base_url = html_escape(base_url),
    )
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_url_encodes_email() {
        let config = Config {
            base_url: "https://weather.example/".to_string(),
            ..Config::test_default()
        };
        let service = EmailService::new(&config);
        assert_eq!(
            service.unsubscribe_url("a+b@c.io", "abc123"),
            "https://weather.example/api/unsubscribe?token=abc123&email=a%2Bb%40c.io"
        );
    }

    #[test]
    fn test_welcome_shows_four_decimals() {
        let html = welcome_html(
            "https://weather.example",
            GeoPoint {
                lat: 42.360_08,
                lon: -71.058_88,
            },
            "https://weather.example/api/unsubscribe?token=t&email=x",
        );
        assert!(html.contains("42.3601, -71.0589"));
        assert!(html.contains("token=t&amp;email=x"));
    }

    #[tokio::test]
    async fn test_unconfigured_send_fails() {
        let service = EmailService::new(&Config::test_default());
        assert!(!service.is_configured());
        assert!(service.send("a@b.co", "s", "<p></p>").await.is_err());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short natural-language advisories for current conditions.
//!
//! Generated text comes from Gemini and is cached for an hour per
//! conditions fingerprint, so repeated polls with unchanged weather cost
//! one provider call. Never fails upward: on provider failure the last
//! cached text (even if expired) is used, otherwise an empty string.

use crate::error::WeatherError;
use crate::models::conditions::CurrentConditions;
use crate::services::cache::{Lookup, TtlCache};
use crate::services::provider::{check_response_json, transport_error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifetime of a generated summary.
pub const SUMMARY_TTL: Duration = Duration::from_secs(60 * 60);

const GENERATION_TEMPERATURE: f32 = 0.4;
const MAX_OUTPUT_TOKENS: u32 = 80;

/// Cache key: the parts of the conditions the advisory depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub condition: String,
    pub temperature_celsius: i64,
    pub wind_speed: String,
}

impl SummaryKey {
    pub fn fingerprint(conditions: &CurrentConditions) -> Self {
        Self {
            condition: conditions.short_description.trim().to_lowercase(),
            temperature_celsius: conditions.temperature_celsius,
            wind_speed: conditions.wind_speed.trim().to_string(),
        }
    }
}

pub type SummaryCache = TtlCache<SummaryKey, String>;

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Single-turn generation. An empty string is a valid "no result".
    pub async fn generate(&self, prompt: &str) -> Result<String, WeatherError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: GENERATION_TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        let parsed: GenerateResponse = check_response_json("gemini", response).await?;
        Ok(parsed.first_text().unwrap_or_default())
    }
}

/// Produces advisories, consulting the cache first.
#[derive(Clone)]
pub struct SummaryGenerator {
    client: Option<GeminiClient>,
    cache: SummaryCache,
}

impl SummaryGenerator {
    /// Without a client every miss yields an empty summary.
    pub fn new(client: Option<GeminiClient>, cache: SummaryCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Advisory for `conditions`, or `""` when nothing is available.
    pub async fn summarize(&self, conditions: &CurrentConditions) -> String {
        let key = SummaryKey::fingerprint(conditions);

        let stale = match self.cache.lookup(&key) {
            Lookup::Fresh(text) => {
                tracing::debug!(condition = %key.condition, "Summary cache hit");
                return text;
            }
            Lookup::Stale(text) => Some(text),
            Lookup::Miss => None,
        };

        let Some(client) = &self.client else {
            return stale.unwrap_or_default();
        };

        match client.generate(&build_prompt(conditions)).await {
            Ok(raw) => {
                let text = clean_summary(&raw);
                if text.is_empty() {
                    return stale.unwrap_or_default();
                }
                self.cache.set(key, text.clone());
                text
            }
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::warn!(error = %e, "Summary provider rate limited");
                } else {
                    tracing::warn!(error = %e, "Summary generation failed");
                }
                stale.unwrap_or_default()
            }
        }
    }
}

fn build_prompt(conditions: &CurrentConditions) -> String {
    format!(
        "You are a weather assistant.\n\
         Write EXACTLY 2 short sentences.\n\
         \n\
         Sentence 1: describe the weather briefly and say what to wear \
         (hat, jacket, coat, sunglasses, etc.).\n\
         Sentence 2: give a car/travel safety hint. Mention an umbrella or \
         road caution ONLY if relevant.\n\
         \n\
         Weather:\n\
         Temperature: {}°C\n\
         Condition: {}\n\
         Wind: {}\n\
         \n\
         Do not add emojis.\n\
         Do not exceed 2 sentences.\n",
        conditions.temperature_celsius, conditions.short_description, conditions.wind_speed
    )
}

/// Trim whitespace and any quote characters wrapped around the text.
pub fn clean_summary(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'))
        .trim()
        .to_string()
}

/// Sentence shown when there are no conditions at all.
pub fn default_sentence(daytime: bool) -> &'static str {
    if daytime {
        "It's sunny with a gentle breeze. Perfect weather!"
    } else {
        "A peaceful night with clear skies."
    }
}

/// Static two-sentence advisory used when no generated summary exists:
/// clothing for the temperature, then a travel tip for the conditions.
pub fn fallback_advisory(conditions: &CurrentConditions) -> String {
    let clothing = match conditions.temperature_celsius {
        t if t >= 27 => "It's hot out, so wear light clothing and sunglasses.",
        t if t >= 16 => "It's mild, so a light layer should be enough.",
        t if t >= 4 => "It's cool, so bring a jacket.",
        _ => "It's cold, so wear a warm coat and gloves.",
    };

    let text = conditions.short_description.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
    let tip = if has(&["thunder", "storm"]) {
        "Stay indoors if you can and avoid driving until the storm passes."
    } else if has(&["rain", "shower", "drizzle"]) {
        "Take an umbrella and leave extra braking distance on wet roads."
    } else if has(&["snow", "sleet", "hail", "ice"]) {
        "Roads may be slick, so drive slowly and leave extra room."
    } else if has(&["fog", "mist", "haze"]) {
        "Visibility is reduced, so use low beams and drive carefully."
    } else {
        "Roads should be clear, but stay alert while driving."
    };

    format!("{clothing} {tip}")
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
    }
}

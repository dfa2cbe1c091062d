// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forward geocoding of free-text place names.
//!
//! Mapbox is used when a token is configured, otherwise OpenStreetMap
//! Nominatim. Both are restricted to one country and return only the top
//! result. One round trip, no retry.

use crate::error::WeatherError;
use crate::models::location::Location;
use crate::services::provider::{check_response_json, transport_error};
use serde::Deserialize;

#[derive(Clone)]
enum Provider {
    Mapbox { base_url: String, token: String },
    Nominatim { base_url: String },
}

/// Geocoding client.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    provider: Provider,
    country: String,
}

impl Geocoder {
    pub fn mapbox(http: reqwest::Client, base_url: &str, token: &str, country: &str) -> Self {
        Self {
            http,
            provider: Provider::Mapbox {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: token.to_string(),
            },
            country: country.to_string(),
        }
    }

    pub fn nominatim(http: reqwest::Client, base_url: &str, country: &str) -> Self {
        Self {
            http,
            provider: Provider::Nominatim {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            country: country.to_string(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            Provider::Mapbox { .. } => "mapbox",
            Provider::Nominatim { .. } => "nominatim",
        }
    }

    /// Resolve a place name to coordinates and a canonical label.
    ///
    /// Fails with `EmptyQuery` for blank input and `NotFound` when the
    /// provider has no results.
    pub async fn resolve(&self, query: &str) -> Result<Location, WeatherError> {
        let query = normalize_query(query).ok_or(WeatherError::EmptyQuery)?;

        let location = match &self.provider {
            Provider::Mapbox { base_url, token } => {
                self.resolve_mapbox(base_url, token, &query).await?
            }
            Provider::Nominatim { base_url } => self.resolve_nominatim(base_url, &query).await?,
        };

        let location = location.ok_or_else(|| WeatherError::NotFound(query.clone()))?;
        tracing::debug!(
            query = %query,
            label = %location.label,
            provider = self.provider_name(),
            "Geocoded"
        );
        Ok(location)
    }

    async fn resolve_mapbox(
        &self,
        base_url: &str,
        token: &str,
        query: &str,
    ) -> Result<Option<Location>, WeatherError> {
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            base_url,
            urlencoding::encode(query)
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("types", "place,region"),
                ("country", self.country.as_str()),
                ("limit", "1"),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| transport_error("mapbox", e))?;

        let body: MapboxResponse = check_response_json("mapbox", response).await?;
        Ok(body.features.into_iter().next().map(|f| {
            let [lon, lat] = f.center;
            Location::new(lat, lon, f.place_name)
        }))
    }

    async fn resolve_nominatim(
        &self,
        base_url: &str,
        query: &str,
    ) -> Result<Option<Location>, WeatherError> {
        let url = format!("{}/search", base_url);
        let country = self.country.to_lowercase();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "json"),
                ("q", query),
                ("limit", "1"),
                ("countrycodes", country.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("nominatim", e))?;

        let body: Vec<NominatimPlace> = check_response_json("nominatim", response).await?;
        let Some(place) = body.into_iter().next() else {
            return Ok(None);
        };

        // Nominatim sends coordinates as strings
        let parse = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|e| WeatherError::Provider(format!("nominatim bad coordinate: {e}")))
        };
        Ok(Some(Location::new(
            parse(&place.lat)?,
            parse(&place.lon)?,
            place.display_name,
        )))
    }
}

/// Trim and lowercase a query; `None` if nothing is left.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    /// `[longitude, latitude]`
    center: [f64; 2],
    place_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Denver "), Some("denver".to_string()));
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query(""), None);
    }

    #[tokio::test]
    async fn test_blank_query_never_hits_network() {
        // Unroutable base URL: any request would fail with Provider, not EmptyQuery
        let geocoder = Geocoder::nominatim(reqwest::Client::new(), "http://127.0.0.1:9", "US");
        assert_eq!(
            geocoder.resolve("  ").await.unwrap_err(),
            WeatherError::EmptyQuery
        );
    }
}

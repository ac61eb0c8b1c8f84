//! Geocoding providers. The `Geocoder` only sees `GeocodingProvider`; the HTTP
//! transport is swappable without touching variant generation or caching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::geo::Coordinate;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {0}")]
    Status(u16),

    #[error("Malformed provider payload: {0}")]
    Payload(String),
}

/// Resolves one query string. `Ok(None)` means the provider answered with no match.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, ProviderError>;
}

/// Nominatim-compatible search endpoint (`?format=json&q=..&limit=1`).
#[derive(Clone)]
pub struct HttpGeocodingProvider {
    client: Client,
    endpoint: String,
    user_agent: String,
}

impl HttpGeocodingProvider {
    pub fn new(
        endpoint: String,
        user_agent: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            user_agent,
        })
    }
}

#[async_trait]
impl GeocodingProvider for HttpGeocodingProvider {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let coordinate = first_coordinate(&body)?;
        debug!("Provider lookup '{query}' -> {coordinate:?}");
        Ok(coordinate)
    }
}

/// Extracts the first usable coordinate from a provider result array.
/// `lat`/`lon` may arrive as strings (Nominatim) or numbers.
fn first_coordinate(body: &Value) -> Result<Option<Coordinate>, ProviderError> {
    let places = body
        .as_array()
        .ok_or_else(|| ProviderError::Payload("expected a JSON array".to_string()))?;

    Ok(places.iter().find_map(|place| {
        let lat = number_field(place.get("lat")?)?;
        let lon = number_field(place.get("lon")?)?;
        Coordinate::new(lat, lon)
    }))
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

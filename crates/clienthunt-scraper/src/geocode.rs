//! Best-effort forward geocoding through a Nominatim-compatible endpoint.

use crate::error::ScraperError;
use crate::fetch::{build_client, fetch_json};
use crate::settings::ScraperSettings;

pub struct Geocoder {
    client: reqwest::Client,
    search_url: String,
    user_agent: String,
}

impl Geocoder {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.request_timeout_secs, &settings.user_agent)?,
            search_url: format!(
                "{}/search",
                settings.endpoints.nominatim_base_url.trim_end_matches('/')
            ),
            user_agent: settings.user_agent.clone(),
        })
    }

    /// Look up `address` and return `(latitude, longitude)` of the top hit.
    ///
    /// Failures and empty results both yield `None`; coordinates are never
    /// guessed.
    pub async fn geocode(&self, address: &str) -> Option<(f64, f64)> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        match self.lookup(address).await {
            Ok(coords) => coords,
            Err(err) => {
                tracing::debug!(address, error = %err, "geocoding failed");
                None
            }
        }
    }

    async fn lookup(&self, address: &str) -> Result<Option<(f64, f64)>, ScraperError> {
        let body = fetch_json(
            &self.client,
            &self.search_url,
            &[("q", address), ("format", "json"), ("limit", "1")],
            &self.user_agent,
        )
        .await?;
        Ok(body
            .as_array()
            .and_then(|hits| hits.first())
            .and_then(parse_hit))
    }
}

/// Nominatim returns `lat`/`lon` as strings.
fn parse_hit(hit: &serde_json::Value) -> Option<(f64, f64)> {
    let coord = |key: &str| -> Option<f64> {
        match hit.get(key)? {
            serde_json::Value::String(s) => s.trim().parse().ok(),
            serde_json::Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };
    let lat = coord("lat")?;
    let lon = coord("lon")?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

//! Google Places Web Service (text search + place details).

use clienthunt_core::SourceKey;
use futures::stream::{self, StreamExt};

use crate::error::ScraperError;
use crate::fetch::{build_client, fetch_json};
use crate::rate_limit::{pace, retry_with_backoff};
use crate::settings::ScraperSettings;
use crate::types::{non_blank, RawBusiness, SearchQuery};

const PROVIDER: &str = "google_maps_api";
const DETAIL_FIELDS: &str = "name,formatted_address,formatted_phone_number,website,geometry";
/// Text search returns 20 results per page and at most three pages.
const MAX_PAGES: usize = 3;
/// Place details requests in flight at once. The official API is quota
/// billed, not scraped, so details are not paced like directory pages.
const DETAIL_CONCURRENCY: usize = 5;

pub struct GooglePlacesProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
    max_retries: u32,
    backoff_base_secs: u64,
    inter_request_delay_ms: u64,
}

impl GooglePlacesProvider {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.request_timeout_secs, &settings.user_agent)?,
            base_url: settings
                .endpoints
                .google_places_base_url
                .trim_end_matches('/')
                .to_string(),
            api_key: settings.google_maps_api_key.clone(),
            user_agent: settings.user_agent.clone(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
            inter_request_delay_ms: settings.inter_request_delay_ms,
        })
    }

    /// Run a text search and enrich each hit with place details.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::MissingApiKey`] when no API key is configured.
    /// - [`ScraperError::Api`] when text search returns a status other than
    ///   `OK` or `ZERO_RESULTS`.
    /// - HTTP errors from the text search request after retries.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RawBusiness>, ScraperError> {
        let api_key = self.api_key.as_deref().ok_or(ScraperError::MissingApiKey {
            provider: PROVIDER,
            env_var: "GOOGLE_MAPS_API_KEY",
        })?;

        let text_query = if query.category.trim().is_empty() {
            format!("businesses in {}", query.location.trim())
        } else {
            format!("{} in {}", query.category.trim(), query.location.trim())
        };

        let places = self.text_search(&text_query, api_key, query.max_results).await?;

        let found: Vec<RawBusiness> = stream::iter(places)
            .map(|place| async move {
                match self.place_details(&place, api_key).await {
                    Ok(record) => record,
                    Err(err) => {
                        // The text-search summary is still real upstream data.
                        tracing::debug!(error = %err, "place details failed; using search summary");
                        place_to_business(&place)
                    }
                }
            })
            .buffered(DETAIL_CONCURRENCY)
            .filter_map(|record| async move { record })
            .collect()
            .await;
        Ok(found)
    }

    async fn text_search(
        &self,
        text_query: &str,
        api_key: &str,
        max_results: usize,
    ) -> Result<Vec<serde_json::Value>, ScraperError> {
        let url = format!("{}/textsearch/json", self.base_url);
        let mut places: Vec<serde_json::Value> = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..MAX_PAGES {
            if page > 0 {
                // Next-page tokens only become valid after a short delay.
                pace(self.inter_request_delay_ms).await;
            }
            let mut params: Vec<(&str, &str)> = vec![("key", api_key)];
            match page_token.as_deref() {
                Some(token) => params.push(("pagetoken", token)),
                None => {
                    params.push(("query", text_query));
                    params.push(("type", "establishment"));
                }
            }

            let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                fetch_json(&self.client, &url, &params, &self.user_agent)
            })
            .await?;
            check_api_status(&body)?;

            if let Some(results) = body.get("results").and_then(serde_json::Value::as_array) {
                places.extend(results.iter().cloned());
            }
            if places.len() >= max_results {
                break;
            }
            page_token = body
                .get("next_page_token")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        places.truncate(max_results);
        Ok(places)
    }

    async fn place_details(
        &self,
        place: &serde_json::Value,
        api_key: &str,
    ) -> Result<Option<RawBusiness>, ScraperError> {
        let Some(place_id) = place.get("place_id").and_then(|v| v.as_str()) else {
            return Ok(place_to_business(place));
        };

        let url = format!("{}/details/json", self.base_url);
        let params = [("place_id", place_id), ("key", api_key), ("fields", DETAIL_FIELDS)];
        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            fetch_json(&self.client, &url, &params, &self.user_agent)
        })
        .await?;
        check_api_status(&body)?;

        Ok(body.get("result").and_then(place_to_business))
    }
}

fn check_api_status(body: &serde_json::Value) -> Result<(), ScraperError> {
    let status = body
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("MISSING_STATUS");
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ScraperError::Api {
            provider: PROVIDER,
            status: other.to_string(),
            message: body
                .get("error_message")
                .and_then(|v| v.as_str())
                .unwrap_or("no error message")
                .to_string(),
        }),
    }
}

/// Map a Places `result` object (details or text-search hit) to a record.
fn place_to_business(place: &serde_json::Value) -> Option<RawBusiness> {
    let text = |field: &str| non_blank(place.get(field).and_then(|v| v.as_str()));
    let name = text("name")?;
    let location = place.get("geometry").and_then(|g| g.get("location"));

    let mut record = RawBusiness::named(name, SourceKey::GoogleMapsApi);
    record.contact = text("formatted_phone_number").or_else(|| text("international_phone_number"));
    record.address = text("formatted_address").or_else(|| text("vicinity"));
    record.website = text("website");
    record.latitude = location.and_then(|l| l.get("lat")).and_then(serde_json::Value::as_f64);
    record.longitude = location.and_then(|l| l.get("lng")).and_then(serde_json::Value::as_f64);
    record.raw_data = place.clone();
    Some(record)
}

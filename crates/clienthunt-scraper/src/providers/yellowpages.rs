//! Yellow Pages India search result pages.

use clienthunt_core::SourceKey;

use super::cards::{extract_cards, CardLayout};
use crate::error::ScraperError;
use crate::fetch::{build_client, fetch_page, BROWSER_FALLBACK_UA};
use crate::rate_limit::{pace, retry_with_backoff};
use crate::settings::ScraperSettings;
use crate::types::{RawBusiness, SearchQuery};

const LISTING_LAYOUT: CardLayout = CardLayout {
    card: &[".listing", ".result", ".business-info", ".srp-list-item"],
    name: &[".business-name", ".name", "h3", "h4", ".title"],
    phone: &["a[href^=\"tel:\"]", ".phone", ".contact"],
    address: &[".address", ".location", ".addr"],
    website: &["a.website", "a.track-visit-website", "a[rel~=\"nofollow\"][href^=\"http\"]"],
};

/// Yellow Pages shows at most this many pages for one query.
const MAX_PAGES: u32 = 3;

pub struct YellowPagesProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
    inter_request_delay_ms: u64,
}

impl YellowPagesProvider {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.request_timeout_secs, BROWSER_FALLBACK_UA)?,
            base_url: settings
                .endpoints
                .yellowpages_base_url
                .trim_end_matches('/')
                .to_string(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
            inter_request_delay_ms: settings.inter_request_delay_ms,
        })
    }

    /// Fetch result pages until `max_results` listings are collected or a
    /// page comes back empty.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the first page cannot be loaded. Failures
    /// on later pages end pagination and keep what was already found.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RawBusiness>, ScraperError> {
        let mut found: Vec<RawBusiness> = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 {
                pace(self.inter_request_delay_ms).await;
            }
            let url = self.search_url(query, page)?;
            let result = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                fetch_page(&self.client, url.as_str(), BROWSER_FALLBACK_UA)
            })
            .await;

            let html = match result {
                Ok(html) => html,
                Err(err) if page == 1 => return Err(err),
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "stopping yellow pages pagination");
                    break;
                }
            };

            let listings = extract_cards(&html, &LISTING_LAYOUT, SourceKey::YellowpagesReal);
            tracing::debug!(url = %url, count = listings.len(), "yellow pages page parsed");
            if listings.is_empty() {
                break;
            }
            found.extend(listings);
            if found.len() >= query.max_results {
                break;
            }
        }

        found.truncate(query.max_results);
        Ok(found)
    }

    fn search_url(&self, query: &SearchQuery, page: u32) -> Result<reqwest::Url, ScraperError> {
        let what = if query.category.trim().is_empty() {
            "business"
        } else {
            query.category.trim()
        };
        let endpoint = format!("{}/search", self.base_url);
        let mut params = vec![("what", what.to_string()), ("where", query.location.trim().to_string())];
        if page > 1 {
            params.push(("page", page.to_string()));
        }
        reqwest::Url::parse_with_params(&endpoint, &params).map_err(|e| {
            ScraperError::InvalidBaseUrl {
                url: endpoint.clone(),
                reason: e.to_string(),
            }
        })
    }
}

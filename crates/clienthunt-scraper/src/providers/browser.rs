//! Browser-style fetch of a general business directory.
//!
//! The page is requested with browser fingerprints, then mined for
//! schema.org JSON-LD and, failing that, for generic business cards.

use clienthunt_core::SourceKey;

use super::cards::{extract_cards, CardLayout};
use super::jsonld::extract_jsonld_businesses;
use crate::error::ScraperError;
use crate::fetch::{build_client, fetch_html};
use crate::settings::ScraperSettings;
use crate::types::{RawBusiness, SearchQuery};

const GENERIC_LAYOUT: CardLayout = CardLayout {
    card: &[
        ".business-card",
        ".listing",
        ".company",
        ".store",
        ".business-item",
        ".result-item",
        ".directory-item",
    ],
    name: &[".business-name", ".company-name", ".name", "h2", "h3", "h4", ".title"],
    phone: &["a[href^=\"tel:\"]", ".phone", ".contact", ".mobile"],
    address: &[".address", ".location", ".addr", "address"],
    website: &["a.website", "a[rel~=\"nofollow\"][href^=\"http\"]"],
};

const DEFAULT_CATEGORY_SLUG: &str = "business-services";

pub struct BrowserDirectoryProvider {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout_secs: u64,
}

impl BrowserDirectoryProvider {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.request_timeout_secs, &settings.user_agent)?,
            base_url: settings
                .endpoints
                .directory_base_url
                .trim_end_matches('/')
                .to_string(),
            user_agent: settings.user_agent.clone(),
            timeout_secs: settings.request_timeout_secs,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Blocked`] when every attempt hit a bot
    /// challenge, or [`ScraperError::AllAttemptsFailed`] when the page could
    /// not be fetched.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RawBusiness>, ScraperError> {
        let url = self.directory_url(query);
        let html = fetch_html(&self.client, &url, self.timeout_secs, &self.user_agent).await?;

        let mut found = parse_directory_page(&html);
        tracing::debug!(url = %url, count = found.len(), "directory page parsed");
        found.truncate(query.max_results);
        Ok(found)
    }

    fn directory_url(&self, query: &SearchQuery) -> String {
        let category = kebab(&query.category);
        let category = if category.is_empty() {
            DEFAULT_CATEGORY_SLUG.to_string()
        } else {
            category
        };
        format!("{}/{category}/{}", self.base_url, kebab(&query.location))
    }
}

pub(crate) fn parse_directory_page(html: &str) -> Vec<RawBusiness> {
    let structured = extract_jsonld_businesses(html, SourceKey::Playwright);
    if !structured.is_empty() {
        return structured;
    }
    extract_cards(html, &GENERIC_LAYOUT, SourceKey::Playwright)
}

/// `"IT Companies"` → `"it-companies"`.
fn kebab(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

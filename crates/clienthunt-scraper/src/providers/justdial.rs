//! JustDial listing pages.
//!
//! JustDial renders most listings client-side from an embedded JSON state
//! blob, so the page is mined for that first and for `.resultbox` cards
//! second.

use std::sync::LazyLock;

use clienthunt_core::SourceKey;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;

use super::cards::{extract_cards, CardLayout};
use crate::error::ScraperError;
use crate::fetch::{build_client, fetch_page, BROWSER_FALLBACK_UA};
use crate::rate_limit::{pace, retry_with_backoff};
use crate::settings::ScraperSettings;
use crate::types::{non_blank, RawBusiness, SearchQuery};

static STATE_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script[^>]*(?:id\s*=\s*["']__NEXT_DATA__["']|type\s*=\s*["']application/json["'])[^>]*>(.*?)</script>"#,
    )
    .expect("valid regex")
});

static INITIAL_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\})\s*;\s*</script>")
        .expect("valid regex")
});

/// Keys under which JustDial state blobs keep listing arrays.
const LISTING_KEYS: [&str; 4] = ["results", "businesses", "listings", "docs"];
const NAME_FIELDS: [&str; 5] = ["compname", "name", "businessName", "title", "company_name"];
const PHONE_FIELDS: [&str; 6] = ["mobile", "phone", "contact", "telephone", "mob", "phoneNumber"];
const ADDRESS_FIELDS: [&str; 4] = ["address", "fullAddress", "locality", "area"];
const WEBSITE_FIELDS: [&str; 3] = ["website", "web", "url"];

const RESULTBOX_LAYOUT: CardLayout = CardLayout {
    card: &[".resultbox", ".cntanr", ".store-details"],
    name: &[".resultbox_title_anchor", ".fn", ".lng_cont_name", ".store-name", "h3", "h4", ".title"],
    phone: &["a[href^=\"tel:\"]", ".callcontent", ".contact-info", ".mobilesv"],
    address: &[".resultbox_address", ".cont_fl_addr", ".address", ".adr", ".locatcity"],
    website: &["a.website", "a[title=\"Website\"]"],
};

/// Common category phrases mapped to JustDial's URL slugs.
const CATEGORY_SLUGS: &[(&str, &str)] = &[
    ("restaurants", "Restaurants"),
    ("it companies", "Software-Companies"),
    ("software companies", "Software-Companies"),
    ("hotels", "Hotels"),
    ("hospitals", "Hospitals"),
    ("schools", "Schools"),
    ("banks", "Banks"),
    ("grocery stores", "Grocery-Stores"),
    ("beauty parlours", "Beauty-Parlours"),
    ("car repair", "Car-Repair-Services"),
    ("plumbers", "Plumbers"),
    ("electricians", "Electricians"),
    ("shops", "General-Stores"),
    ("services", "Services"),
];

/// Search terms used when the caller gave no category.
const DEFAULT_TERMS: [&str; 2] = ["restaurants", "services"];

pub struct JustdialProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
    inter_request_delay_ms: u64,
}

impl JustdialProvider {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.request_timeout_secs, BROWSER_FALLBACK_UA)?,
            base_url: settings
                .endpoints
                .justdial_base_url
                .trim_end_matches('/')
                .to_string(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
            inter_request_delay_ms: settings.inter_request_delay_ms,
        })
    }

    /// Search each term, walking the candidate URLs until one yields listings.
    ///
    /// # Errors
    ///
    /// Returns the last fetch error when no page could be fetched at all.
    /// Pages that load but contain no listings produce an empty `Vec`.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RawBusiness>, ScraperError> {
        let terms: Vec<String> = if query.category.trim().is_empty() {
            DEFAULT_TERMS.iter().map(|t| (*t).to_string()).collect()
        } else {
            vec![query.category.trim().to_string()]
        };

        let mut found: Vec<RawBusiness> = Vec::new();
        let mut last_err: Option<ScraperError> = None;
        let mut fetched_any = false;
        let mut first_request = true;

        for term in &terms {
            if found.len() >= query.max_results {
                break;
            }
            for url in self.candidate_urls(&query.location, term) {
                if !first_request {
                    pace(self.inter_request_delay_ms).await;
                }
                first_request = false;

                let result = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                    fetch_page(&self.client, &url, BROWSER_FALLBACK_UA)
                })
                .await;

                match result {
                    Ok(html) => {
                        fetched_any = true;
                        let listings = parse_listing_page(&html);
                        tracing::debug!(url = %url, count = listings.len(), "justdial page parsed");
                        if !listings.is_empty() {
                            found.extend(listings);
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::debug!(url = %url, error = %err, "justdial page fetch failed");
                        last_err = Some(err);
                    }
                }
            }
        }

        if !fetched_any {
            if let Some(err) = last_err {
                return Err(err);
            }
        }

        found.truncate(query.max_results);
        Ok(found)
    }

    fn candidate_urls(&self, location: &str, term: &str) -> Vec<String> {
        let city = title_slug(location);
        let category = category_slug(term);
        vec![
            format!("{}/{city}/{category}", self.base_url),
            format!("{}/{city}/{category}-near-me", self.base_url),
            format!(
                "{}/search-{}-{}",
                self.base_url,
                utf8_percent_encode(term.trim(), NON_ALPHANUMERIC),
                utf8_percent_encode(location.trim(), NON_ALPHANUMERIC),
            ),
        ]
    }
}

/// Extract listings from a JustDial page: embedded state first, then cards.
pub(crate) fn parse_listing_page(html: &str) -> Vec<RawBusiness> {
    let from_state = extract_state_listings(html);
    if !from_state.is_empty() {
        return from_state;
    }
    extract_cards(html, &RESULTBOX_LAYOUT, SourceKey::JustdialReal)
}

fn extract_state_listings(html: &str) -> Vec<RawBusiness> {
    let blobs = STATE_SCRIPT_RE
        .captures_iter(html)
        .chain(INITIAL_STATE_RE.captures_iter(html))
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| serde_json::from_str::<serde_json::Value>(m.as_str().trim()).ok());

    let mut results = Vec::new();
    for blob in blobs {
        let mut arrays = Vec::new();
        collect_listing_arrays(&blob, &mut arrays);
        for array in arrays {
            results.extend(array.iter().filter_map(listing_from_json));
        }
    }
    results
}

fn collect_listing_arrays<'a>(value: &'a serde_json::Value, out: &mut Vec<&'a Vec<serde_json::Value>>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                match child {
                    serde_json::Value::Array(items) if LISTING_KEYS.iter().any(|k| *k == key.as_str()) => {
                        out.push(items);
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        collect_listing_arrays(child, out);
                    }
                    _ => {}
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_listing_arrays(item, out);
            }
        }
        _ => {}
    }
}

fn listing_from_json(item: &serde_json::Value) -> Option<RawBusiness> {
    let field = |names: &[&str]| -> Option<String> {
        names.iter().find_map(|name| match item.get(*name)? {
            serde_json::Value::String(s) => non_blank(Some(s)),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let name = field(&NAME_FIELDS)?;
    let mut record = RawBusiness::named(name, SourceKey::JustdialReal);
    record.contact = field(&PHONE_FIELDS);
    record.address = field(&ADDRESS_FIELDS);
    record.website = field(&WEBSITE_FIELDS)
        .filter(|w| w.starts_with("http") || w.starts_with("www."));
    record.location = field(&["city"]);
    record.latitude = item
        .get("lat")
        .or_else(|| item.get("latitude"))
        .and_then(as_coordinate);
    record.longitude = item
        .get("lon")
        .or_else(|| item.get("lng"))
        .or_else(|| item.get("longitude"))
        .and_then(as_coordinate);
    record.raw_data = item.clone();
    Some(record)
}

fn as_coordinate(v: &serde_json::Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

/// `"new delhi"` → `"New-Delhi"`.
fn title_slug(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

fn category_slug(term: &str) -> String {
    let lowered = term.trim().to_lowercase();
    CATEGORY_SLUGS
        .iter()
        .find(|(phrase, _)| *phrase == lowered)
        .map_or_else(|| title_slug(term), |(_, slug)| (*slug).to_string())
}

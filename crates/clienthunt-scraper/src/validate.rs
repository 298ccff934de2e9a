//! Field-level sanity checks that turn a [`RawBusiness`] into a
//! [`BusinessRecord`] or reject it.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use clienthunt_core::{BusinessRecord, DataType};
use regex::Regex;

use crate::types::{collapse_whitespace, RawBusiness};

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 200;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 13;

/// A run of digits possibly broken by spaces, dashes, dots or parentheses.
static PHONE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().-]*\d").expect("valid regex"));

/// Indian mobile: optional `+91`, then 10 digits starting 6-9.
static INDIAN_MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?91)?[6-9]\d{9}$").expect("valid regex"));

/// An Indian mobile anywhere in free text, e.g. one of several listed numbers.
static EMBEDDED_MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+91[-\s]?)?[6-9]\d{9}").expect("valid regex"));

/// Placeholder markers that never appear in a real contact value.
const CONTACT_DEMO_MARKERS: [&str; 4] = ["demo", "fake", "test", "sample"];
const WEBSITE_DEMO_MARKERS: [&str; 5] = ["demo", "fake", "test", "sample", "localhost"];

/// Why a raw record was dropped. Counted, never surfaced per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyName,
    NameLength,
    InvalidContact,
    InvalidWebsite,
    NoContactChannel,
}

/// Validate and normalize one raw record.
///
/// The record's location is always `query_location`, so the same business
/// reported by two sources shares one dedup key. A locality reported by the
/// provider is appended to the address instead. `query_category` is recorded
/// unless empty, in which case the provider's own category (if any) is kept.
///
/// Contact and website values carrying placeholder markers are cleared
/// first; see [`scrub_demo_markers`].
///
/// # Errors
///
/// Returns the first [`Rejection`] rule the record breaks.
pub fn validate(
    mut raw: RawBusiness,
    query_location: &str,
    query_category: &str,
    scraped_at: DateTime<Utc>,
) -> Result<BusinessRecord, Rejection> {
    scrub_demo_markers(&mut raw);

    let name = collapse_whitespace(&raw.name);
    if name.is_empty() {
        return Err(Rejection::EmptyName);
    }
    let name_chars = name.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&name_chars) {
        return Err(Rejection::NameLength);
    }

    let contact = match raw.contact.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(normalize_phone(text).ok_or(Rejection::InvalidContact)?),
    };

    let website = match raw.website.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(normalize_website(text).ok_or(Rejection::InvalidWebsite)?),
    };

    let mut address = raw
        .address
        .as_deref()
        .map(collapse_whitespace)
        .filter(|a| !a.is_empty());

    if contact.is_none() && website.is_none() && address.is_none() {
        return Err(Rejection::NoContactChannel);
    }

    let locality = raw
        .location
        .as_deref()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty());
    if let (Some(addr), Some(locality)) = (address.as_mut(), locality) {
        if !addr.to_lowercase().contains(&locality.to_lowercase()) {
            addr.push_str(", ");
            addr.push_str(&locality);
        }
    }

    let location = collapse_whitespace(query_location);

    let category = {
        let query_category = collapse_whitespace(query_category);
        if query_category.is_empty() {
            raw.category
                .as_deref()
                .map(collapse_whitespace)
                .unwrap_or_default()
        } else {
            query_category
        }
    };

    let (latitude, longitude) = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lng)) if valid_coordinates(lat, lng) => (Some(lat), Some(lng)),
        _ => (None, None),
    };

    Ok(BusinessRecord {
        name,
        contact,
        address,
        website,
        category,
        location,
        latitude,
        longitude,
        source: raw.source,
        scraped_at,
        data_type: DataType::RealData,
    })
}

/// Find the first plausible phone number in `text` and return it with
/// separators stripped (a leading `+` is kept).
///
/// Accepts Indian mobiles (`+91 98765 43210`) and any other
/// number with 10 to 13 digits, which covers landlines with an STD code.
#[must_use]
pub fn normalize_phone(text: &str) -> Option<String> {
    PHONE_RUN_RE.find_iter(text).find_map(|m| {
        let run = m.as_str();
        let digits: String = run.chars().filter(char::is_ascii_digit).collect();
        let normalized = if run.starts_with('+') {
            format!("+{digits}")
        } else {
            digits.clone()
        };
        let plausible = INDIAN_MOBILE_RE.is_match(&normalized)
            || (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len());
        plausible.then_some(normalized)
    })
    .or_else(|| first_embedded_mobile(text))
}

/// First standalone Indian mobile in `text`. Covers fields listing several
/// numbers separated only by spaces, which merge into one over-long run.
fn first_embedded_mobile(text: &str) -> Option<String> {
    EMBEDDED_MOBILE_RE.find_iter(text).find_map(|m| {
        let digit_before = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        let digit_after = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if digit_before || digit_after {
            return None;
        }
        let run = m.as_str();
        let digits: String = run.chars().filter(char::is_ascii_digit).collect();
        Some(if run.starts_with('+') {
            format!("+{digits}")
        } else {
            digits
        })
    })
}

/// Clear contact and website values that carry placeholder markers such as
/// `demo` or `sample`. Returns how many fields were cleared; the record
/// itself is kept and judged on what remains.
pub fn scrub_demo_markers(raw: &mut RawBusiness) -> usize {
    let mut cleared = 0;
    if raw
        .contact
        .as_deref()
        .is_some_and(|c| contains_marker(c, &CONTACT_DEMO_MARKERS))
    {
        raw.contact = None;
        cleared += 1;
    }
    if raw
        .website
        .as_deref()
        .is_some_and(|w| contains_marker(w, &WEBSITE_DEMO_MARKERS))
    {
        raw.website = None;
        cleared += 1;
    }
    cleared
}

/// True when an accepted record still mentions a placeholder marker in its
/// name or address. Used for the data-quality warning only.
#[must_use]
pub fn has_demo_indicators(record: &BusinessRecord) -> bool {
    [Some(record.name.as_str()), record.address.as_deref()]
        .into_iter()
        .flatten()
        .any(|text| contains_marker(text, &CONTACT_DEMO_MARKERS))
}

fn contains_marker(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|m| lowered.contains(m))
}

/// Check that `text` is an absolute http(s) URL with a dotted host.
/// A bare `www.` prefix is promoted to `http://`.
#[must_use]
pub fn normalize_website(text: &str) -> Option<String> {
    let candidate = if text.to_ascii_lowercase().starts_with("www.") {
        format!("http://{text}")
    } else {
        text.to_string()
    };
    let url = reqwest::Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return None;
    }
    Some(candidate)
}

fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;

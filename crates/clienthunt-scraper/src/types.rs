//! Unvalidated provider output and the per-source search query.

use clienthunt_core::SourceKey;

/// A business listing as a provider extracted it, before validation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawBusiness {
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    /// Locality reported by the provider, if any.
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: SourceKey,
    /// The provider's original object or card text, kept for debugging.
    pub raw_data: serde_json::Value,
}

impl RawBusiness {
    /// Start a record with only a name; everything else is filled in by the
    /// adapter that found it.
    #[must_use]
    pub fn named(name: impl Into<String>, source: SourceKey) -> Self {
        Self {
            name: name.into(),
            contact: None,
            address: None,
            website: None,
            category: None,
            location: None,
            latitude: None,
            longitude: None,
            source,
            raw_data: serde_json::Value::Null,
        }
    }
}

/// What one provider is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub location: String,
    /// Empty when the caller did not scope the scrape to a category.
    pub category: String,
    pub max_results: usize,
}

/// Fold a string option to `None` when it is missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trim and collapse internal runs of whitespace to single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CoreError;

/// Canonical key of a registered business-data source.
///
/// The set is closed: every accepted record carries one of these, and the
/// registry maps each key to exactly one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKey {
    JustdialReal,
    GoogleMapsApi,
    YellowpagesReal,
    Playwright,
}

impl SourceKey {
    pub const ALL: [SourceKey; 4] = [
        SourceKey::JustdialReal,
        SourceKey::GoogleMapsApi,
        SourceKey::YellowpagesReal,
        SourceKey::Playwright,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKey::JustdialReal => "justdial_real",
            SourceKey::GoogleMapsApi => "google_maps_api",
            SourceKey::YellowpagesReal => "yellowpages_real",
            SourceKey::Playwright => "playwright",
        }
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::UnknownSource(s.to_string()))
    }
}

/// Provenance tag carried by every stored record.
///
/// There is deliberately a single variant: a record that did not come from
/// an external source has no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "REAL_DATA")]
    RealData,
}

impl DataType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::RealData => "REAL_DATA",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REAL_DATA" => Ok(DataType::RealData),
            other => Err(CoreError::UnknownDataType(other.to_string())),
        }
    }
}

/// One observed business listing that passed validation.
///
/// Field order matches the CSV export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    /// Phone number with separators stripped, e.g. `"+919876543210"`.
    pub contact: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    /// Query category; empty when the scrape was not category-scoped.
    pub category: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: SourceKey,
    pub scraped_at: DateTime<Utc>,
    pub data_type: DataType,
}

impl BusinessRecord {
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// In-memory duplicate key; see [`normalize_key`].
    #[must_use]
    pub fn dedup_key(&self) -> String {
        normalize_key(&self.name, &self.location)
    }

    /// Persisted unique key; see [`make_business_key`].
    #[must_use]
    pub fn business_key(&self) -> String {
        make_business_key(&self.name, &self.location)
    }
}

/// Lower-cased, whitespace-collapsed `name \0 location`.
#[must_use]
pub fn normalize_key(name: &str, location: &str) -> String {
    format!("{}\x00{}", fold(name), fold(location))
}

/// SHA-256 over [`normalize_key`], hex-encoded.
#[must_use]
pub fn make_business_key(name: &str, location: &str) -> String {
    let input = normalize_key(name, location);
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

fn fold(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "business_test.rs"]
mod tests;

//! Request and result types for one orchestrated scrape.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clienthunt_core::{BusinessRecord, DataType, SourceKey};
use serde::Serialize;

use crate::error::ScraperError;

/// A validated scrape request. Construct with [`ScrapeRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    location: String,
    category: String,
    sources: Vec<String>,
    max_results_per_source: usize,
}

impl ScrapeRequest {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidRequest`] when `location` is blank or
    /// `max_results_per_source` is zero.
    pub fn new(
        location: &str,
        category: &str,
        sources: Vec<String>,
        max_results_per_source: usize,
    ) -> Result<Self, ScraperError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ScraperError::InvalidRequest(
                "location must not be empty".to_string(),
            ));
        }
        if max_results_per_source == 0 {
            return Err(ScraperError::InvalidRequest(
                "max_results_per_source must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            location: location.to_string(),
            category: category.trim().to_string(),
            sources,
            max_results_per_source,
        })
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Source aliases as the caller gave them. Empty means "use defaults".
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    #[must_use]
    pub fn max_results_per_source(&self) -> usize {
        self.max_results_per_source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// The alias did not resolve to a registered source.
    UnknownSource,
    /// The adapter ran and returned an error.
    AdapterFailure,
    /// The request deadline passed before the adapter finished.
    TimedOut,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownSource => "unknown_source",
            Self::AdapterFailure => "adapter_failure",
            Self::TimedOut => "timed_out",
        })
    }
}

/// One per-source failure, reported alongside the accepted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceError {
    /// Canonical key, or the caller's spelling for unknown aliases.
    pub source: String,
    pub kind: SourceErrorKind,
    pub message: String,
}

/// Everything one scrape produced. Per-source failures live in `errors`;
/// a result with zero records and only errors is still a valid result.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub location: String,
    pub category: String,
    /// Accepted records in the order their sources completed.
    pub records: Vec<BusinessRecord>,
    pub per_source: BTreeMap<SourceKey, usize>,
    pub errors: Vec<SourceError>,
    pub sources_attempted: Vec<SourceKey>,
    pub max_results_per_source: usize,
    pub rejected_invalid: usize,
    pub rejected_duplicate: usize,
    /// Contact or website values cleared for carrying placeholder markers.
    pub scrubbed_fields: usize,
    pub total_results: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub data_type: DataType,
}

impl ScrapeResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when at least one source was attempted and none of them
    /// completed without error.
    #[must_use]
    pub fn all_sources_failed(&self) -> bool {
        if self.sources_attempted.is_empty() {
            return !self.errors.is_empty();
        }
        self.sources_attempted.iter().all(|key| {
            self.errors
                .iter()
                .any(|e| e.source == key.as_str() && e.kind != SourceErrorKind::UnknownSource)
        })
    }
}

//! Fan a scrape request out to the registered sources and merge what comes
//! back into one validated, de-duplicated [`ScrapeResult`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use clienthunt_core::{BusinessRecord, DataType, SourceKey};
use futures::stream::{self, StreamExt};

use crate::alias;
use crate::dedup::Deduplicator;
use crate::error::ScraperError;
use crate::geocode::Geocoder;
use crate::providers::{BusinessSource, Provider};
use crate::rate_limit::pace;
use crate::registry::SourceRegistry;
use crate::result::{ScrapeRequest, ScrapeResult, SourceError, SourceErrorKind};
use crate::settings::ScraperSettings;
use crate::types::{RawBusiness, SearchQuery};
use crate::validate::{has_demo_indicators, scrub_demo_markers, validate};

/// Sources used when a request names none.
pub const DEFAULT_SOURCES: [SourceKey; 3] = [
    SourceKey::JustdialReal,
    SourceKey::GoogleMapsApi,
    SourceKey::YellowpagesReal,
];
pub const QUICK_SOURCES: [SourceKey; 2] = [SourceKey::JustdialReal, SourceKey::GoogleMapsApi];
pub const QUICK_MAX_RESULTS: usize = 20;
pub const COMPREHENSIVE_SOURCES: [SourceKey; 3] = DEFAULT_SOURCES;
pub const COMPREHENSIVE_MAX_RESULTS: usize = 50;

enum Outcome {
    Finished(Result<Vec<RawBusiness>, ScraperError>),
    TimedOut,
}

pub struct Orchestrator {
    registry: Arc<SourceRegistry>,
    settings: ScraperSettings,
    geocoder: Option<Geocoder>,
}

impl Orchestrator {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if geocoding is enabled and its HTTP
    /// client cannot be built.
    pub fn new(registry: Arc<SourceRegistry>, settings: ScraperSettings) -> Result<Self, ScraperError> {
        let geocoder = if settings.geocoding_enabled {
            Some(Geocoder::new(&settings)?)
        } else {
            None
        };
        Ok(Self {
            registry,
            settings,
            geocoder,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fast pass over the two highest-yield sources, 20 results each.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidRequest`] for a blank location.
    pub async fn quick_scrape(
        &self,
        location: &str,
        category: &str,
        selected_sources: &[String],
    ) -> Result<ScrapeResult, ScraperError> {
        let sources = or_defaults(selected_sources, &QUICK_SOURCES);
        self.scrape_location(location, category, &sources, QUICK_MAX_RESULTS)
            .await
    }

    /// Every default source, 50 results each.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidRequest`] for a blank location.
    pub async fn comprehensive_scrape(
        &self,
        location: &str,
        category: &str,
        selected_sources: &[String],
    ) -> Result<ScrapeResult, ScraperError> {
        let sources = or_defaults(selected_sources, &COMPREHENSIVE_SOURCES);
        self.scrape_location(location, category, &sources, COMPREHENSIVE_MAX_RESULTS)
            .await
    }

    /// Scrape `location` from `sources` (aliases accepted; empty means
    /// [`DEFAULT_SOURCES`]).
    ///
    /// Per-source problems are reported in [`ScrapeResult::errors`] and never
    /// abort the request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidRequest`] for a blank location or a
    /// zero cap, before any source runs.
    pub async fn scrape_location(
        &self,
        location: &str,
        category: &str,
        sources: &[String],
        max_results_per_source: usize,
    ) -> Result<ScrapeResult, ScraperError> {
        let request = ScrapeRequest::new(location, category, sources.to_vec(), max_results_per_source)?;
        Ok(self.scrape(&request).await)
    }

    /// Run an already-validated request.
    pub async fn scrape(&self, request: &ScrapeRequest) -> ScrapeResult {
        let started_at = Utc::now();
        let clock = tokio::time::Instant::now();
        let deadline = clock + self.settings.deadline;
        let cap = request.max_results_per_source();

        let requested = or_defaults(request.sources(), &DEFAULT_SOURCES);
        let mut errors = Vec::new();
        let mut selected: Vec<(SourceKey, &Provider)> = Vec::new();
        for alias in &requested {
            let resolved = alias::resolve(alias);
            match self.registry.get(&resolved) {
                Some(provider) => {
                    let key = provider.key();
                    if !selected.iter().any(|(k, _)| *k == key) {
                        selected.push((key, provider));
                    }
                }
                None => {
                    tracing::warn!(source = %alias, "unknown scraper source");
                    errors.push(SourceError {
                        source: alias.clone(),
                        kind: SourceErrorKind::UnknownSource,
                        message: format!("unknown scraper source: {alias}"),
                    });
                }
            }
        }

        tracing::info!(
            location = request.location(),
            category = request.category(),
            sources = ?selected.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            max_results_per_source = cap,
            "starting scrape"
        );

        let query = SearchQuery {
            location: request.location().to_string(),
            category: request.category().to_string(),
            max_results: cap,
        };
        let query = &query;
        let sources_attempted: Vec<SourceKey> = selected.iter().map(|(k, _)| *k).collect();

        let outcomes: Vec<(SourceKey, Outcome)> = stream::iter(selected)
            .map(|(key, provider)| async move {
                if tokio::time::Instant::now() >= deadline {
                    return (key, Outcome::TimedOut);
                }
                match tokio::time::timeout_at(deadline, provider.search(query)).await {
                    Ok(result) => (key, Outcome::Finished(result)),
                    Err(_) => (key, Outcome::TimedOut),
                }
            })
            .buffer_unordered(self.settings.max_concurrent_sources.max(1))
            .collect()
            .await;

        let mut records: Vec<BusinessRecord> = Vec::new();
        let mut per_source: BTreeMap<SourceKey, usize> = BTreeMap::new();
        let mut dedup = Deduplicator::new();
        let mut rejected_invalid = 0usize;
        let mut rejected_duplicate = 0usize;
        let mut scrubbed_fields = 0usize;

        for (key, outcome) in outcomes {
            let accepted = per_source.entry(key).or_insert(0);
            match outcome {
                Outcome::Finished(Ok(mut raw)) => {
                    let fetched = raw.len();
                    raw.truncate(cap);
                    for mut item in raw {
                        scrubbed_fields += scrub_demo_markers(&mut item);
                        match validate(item, request.location(), request.category(), Utc::now()) {
                            Ok(record) => {
                                if dedup.accept(&record) {
                                    *accepted += 1;
                                    records.push(record);
                                } else {
                                    rejected_duplicate += 1;
                                }
                            }
                            Err(reason) => {
                                tracing::debug!(source = %key, ?reason, "rejected raw record");
                                rejected_invalid += 1;
                            }
                        }
                    }
                    tracing::info!(source = %key, fetched, count = *accepted, "source completed");
                }
                Outcome::Finished(Err(e)) => {
                    tracing::warn!(source = %key, error = %e, "source failed");
                    errors.push(SourceError {
                        source: key.as_str().to_string(),
                        kind: SourceErrorKind::AdapterFailure,
                        message: e.to_string(),
                    });
                }
                Outcome::TimedOut => {
                    tracing::warn!(source = %key, "source timed out");
                    errors.push(SourceError {
                        source: key.as_str().to_string(),
                        kind: SourceErrorKind::TimedOut,
                        message: format!(
                            "{key} did not finish within {}s",
                            self.settings.deadline.as_secs()
                        ),
                    });
                }
            }
        }

        if let Some(geocoder) = &self.geocoder {
            fill_missing_coordinates(geocoder, &mut records, self.settings.inter_request_delay_ms)
                .await;
        }

        log_data_quality(request.location(), &records, scrubbed_fields);

        let completed_at = Utc::now();
        ScrapeResult {
            location: request.location().to_string(),
            category: request.category().to_string(),
            total_results: records.len(),
            records,
            per_source,
            errors,
            sources_attempted,
            max_results_per_source: cap,
            rejected_invalid,
            rejected_duplicate,
            scrubbed_fields,
            started_at,
            completed_at,
            elapsed: clock.elapsed(),
            data_type: DataType::RealData,
        }
    }
}

fn or_defaults(selected: &[String], defaults: &[SourceKey]) -> Vec<String> {
    if selected.is_empty() {
        defaults.iter().map(|k| k.as_str().to_string()).collect()
    } else {
        selected.to_vec()
    }
}

async fn fill_missing_coordinates(geocoder: &Geocoder, records: &mut [BusinessRecord], delay_ms: u64) {
    let mut looked_up = 0usize;
    for record in records.iter_mut().filter(|r| !r.has_coordinates()) {
        let query = match record.address.as_deref() {
            Some(address) => format!("{address}, {}", record.location),
            None => format!("{}, {}", record.name, record.location),
        };
        if looked_up > 0 {
            pace(delay_ms).await;
        }
        looked_up += 1;
        if let Some((lat, lng)) = geocoder.geocode(&query).await {
            record.latitude = Some(lat);
            record.longitude = Some(lng);
        }
    }
}

fn log_data_quality(location: &str, records: &[BusinessRecord], scrubbed_fields: usize) -> usize {
    let with_contact = records.iter().filter(|r| r.contact.is_some()).count();
    let with_website = records.iter().filter(|r| r.website.is_some()).count();
    let with_address = records.iter().filter(|r| r.address.is_some()).count();
    let with_coordinates = records.iter().filter(|r| r.has_coordinates()).count();
    tracing::info!(
        location,
        count = records.len(),
        with_contact,
        with_website,
        with_address,
        with_coordinates,
        scrubbed_fields,
        "scrape data quality"
    );

    let demo_indicators = records.iter().filter(|r| has_demo_indicators(r)).count();
    if demo_indicators > 0 {
        tracing::warn!(
            location,
            demo_indicators,
            "accepted records mention placeholder markers; check the upstream pages"
        );
    }
    demo_indicators
}

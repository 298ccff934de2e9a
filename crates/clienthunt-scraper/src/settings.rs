use std::time::Duration;

use clienthunt_core::{AppConfig, SourceEndpoints};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DEADLINE_SECS: u64 = 120;
const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 3;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_SECS: u64 = 1;
const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 2_000;

/// Runtime knobs for the providers and the orchestrator.
///
/// Built from [`AppConfig`] in the CLI; tests start from [`Default`] and
/// point `endpoints` at a mock server.
#[derive(Clone)]
pub struct ScraperSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_concurrent_sources: usize,
    pub deadline: Duration,
    pub google_maps_api_key: Option<String>,
    pub geocoding_enabled: bool,
    pub endpoints: SourceEndpoints,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: "clienthunt/0.1 (business-directory)".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            inter_request_delay_ms: DEFAULT_INTER_REQUEST_DELAY_MS,
            max_concurrent_sources: DEFAULT_MAX_CONCURRENT_SOURCES,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            google_maps_api_key: None,
            geocoding_enabled: false,
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl ScraperSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            backoff_base_secs: config.scraper_retry_backoff_base_secs,
            inter_request_delay_ms: config.inter_request_delay_ms(),
            max_concurrent_sources: config.scraper_max_concurrent_sources,
            deadline: Duration::from_secs(config.scraper_deadline_secs),
            google_maps_api_key: config.google_maps_api_key.clone(),
            geocoding_enabled: config.geocoding_enabled,
            endpoints: config.endpoints.clone(),
        }
    }
}

impl std::fmt::Debug for ScraperSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperSettings")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_concurrent_sources", &self.max_concurrent_sources)
            .field("deadline", &self.deadline)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocoding_enabled", &self.geocoding_enabled)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

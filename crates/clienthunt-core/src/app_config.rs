#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Default scrape profile used when the CLI is not told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    Quick,
    Comprehensive,
}

impl std::fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeMode::Quick => write!(f, "quick"),
            ScrapeMode::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

/// Base URLs for every upstream the scraper talks to. Overridable so tests
/// can point providers at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoints {
    pub justdial_base_url: String,
    pub yellowpages_base_url: String,
    pub google_places_base_url: String,
    pub directory_base_url: String,
    pub nominatim_base_url: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            justdial_base_url: "https://www.justdial.com".to_string(),
            yellowpages_base_url: "https://www.yellowpages.in".to_string(),
            google_places_base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            directory_base_url: "https://www.sulekha.com".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub scrape_mode: ScrapeMode,
    pub google_maps_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_deadline_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_concurrent_sources: usize,
    pub scraper_requests_per_minute: u32,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    pub geocoding_enabled: bool,
    pub endpoints: SourceEndpoints,
}

impl AppConfig {
    /// Spacing between consecutive requests to one upstream, derived from
    /// the requests-per-minute budget.
    #[must_use]
    pub fn inter_request_delay_ms(&self) -> u64 {
        60_000 / u64::from(self.scraper_requests_per_minute.max(1))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("scrape_mode", &self.scrape_mode)
            .field("database_url", &self.database_url)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_deadline_secs", &self.scraper_deadline_secs)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_max_concurrent_sources",
                &self.scraper_max_concurrent_sources,
            )
            .field(
                "scraper_requests_per_minute",
                &self.scraper_requests_per_minute,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("geocoding_enabled", &self.geocoding_enabled)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

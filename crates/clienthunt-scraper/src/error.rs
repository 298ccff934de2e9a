use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("request blocked by bot protection at {url}")]
    Blocked { url: String },

    #[error("all fetch attempts failed for {url}")]
    AllAttemptsFailed { url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} API returned status {status}: {message}")]
    Api {
        provider: &'static str,
        status: String,
        message: String,
    },

    #[error("{provider} requires an API key; set {env_var}")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("invalid scrape request: {0}")]
    InvalidRequest(String),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

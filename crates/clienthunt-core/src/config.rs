use crate::app_config::{AppConfig, Environment, ScrapeMode, SourceEndpoints};
use crate::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/businesses.db";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = lookup("CLIENTHUNT_DATABASE_URL")
        .or_else(|_| lookup("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let env = parse_environment(&or_default("CLIENTHUNT_ENV", "development"))?;
    let log_level = or_default("CLIENTHUNT_LOG_LEVEL", "info");
    let scrape_mode = parse_scrape_mode(&or_default("CLIENTHUNT_SCRAPE_MODE", "quick"))?;
    let google_maps_api_key = lookup("GOOGLE_MAPS_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());

    let db_max_connections = parse_u32("CLIENTHUNT_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("CLIENTHUNT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CLIENTHUNT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs =
        parse_u64("CLIENTHUNT_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_deadline_secs = parse_u64("CLIENTHUNT_SCRAPER_DEADLINE_SECS", "120")?;
    let scraper_user_agent = or_default(
        "CLIENTHUNT_SCRAPER_USER_AGENT",
        "clienthunt/0.1 (business-directory)",
    );
    let scraper_max_concurrent_sources =
        parse_usize("CLIENTHUNT_SCRAPER_MAX_CONCURRENT_SOURCES", "3")?;
    let scraper_requests_per_minute = parse_u32("CLIENTHUNT_SCRAPER_REQUESTS_PER_MINUTE", "30")?;
    if scraper_requests_per_minute == 0 {
        return Err(invalid(
            "CLIENTHUNT_SCRAPER_REQUESTS_PER_MINUTE",
            "must be greater than zero".to_string(),
        ));
    }
    let scraper_max_retries = parse_u32("CLIENTHUNT_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("CLIENTHUNT_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;
    let geocoding_enabled = parse_bool("CLIENTHUNT_GEOCODING_ENABLED", "false")?;

    let defaults = SourceEndpoints::default();
    let endpoints = SourceEndpoints {
        justdial_base_url: or_default("CLIENTHUNT_JUSTDIAL_BASE_URL", &defaults.justdial_base_url),
        yellowpages_base_url: or_default(
            "CLIENTHUNT_YELLOWPAGES_BASE_URL",
            &defaults.yellowpages_base_url,
        ),
        google_places_base_url: or_default(
            "CLIENTHUNT_GOOGLE_PLACES_BASE_URL",
            &defaults.google_places_base_url,
        ),
        directory_base_url: or_default(
            "CLIENTHUNT_DIRECTORY_BASE_URL",
            &defaults.directory_base_url,
        ),
        nominatim_base_url: or_default(
            "CLIENTHUNT_NOMINATIM_BASE_URL",
            &defaults.nominatim_base_url,
        ),
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        scrape_mode,
        google_maps_api_key,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_deadline_secs,
        scraper_user_agent,
        scraper_max_concurrent_sources,
        scraper_requests_per_minute,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        geocoding_enabled,
        endpoints,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CLIENTHUNT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Parse the scrape mode. Only live modes exist; `demo` is refused with a
/// message so old `.env` files fail loudly instead of silently switching.
fn parse_scrape_mode(s: &str) -> Result<ScrapeMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "quick" => Ok(ScrapeMode::Quick),
        "comprehensive" => Ok(ScrapeMode::Comprehensive),
        "demo" => Err(ConfigError::InvalidEnvVar {
            var: "CLIENTHUNT_SCRAPE_MODE".to_string(),
            reason: "demo mode has been removed; use quick or comprehensive".to_string(),
        }),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CLIENTHUNT_SCRAPE_MODE".to_string(),
            reason: format!("unknown scrape mode \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

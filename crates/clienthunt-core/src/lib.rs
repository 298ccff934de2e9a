mod app_config;
mod business;
mod config;

pub use app_config::{AppConfig, Environment, ScrapeMode, SourceEndpoints};
pub use business::{make_business_key, normalize_key, BusinessRecord, DataType, SourceKey};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown source key: {0}")]
    UnknownSource(String),

    #[error("unknown data type: {0}")]
    UnknownDataType(String),
}

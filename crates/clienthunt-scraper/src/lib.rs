pub mod alias;
pub mod dedup;
pub mod error;
mod fetch;
pub mod geocode;
pub mod orchestrator;
pub mod providers;
mod rate_limit;
pub mod registry;
pub mod result;
pub mod settings;
pub mod types;
pub mod validate;

pub use dedup::Deduplicator;
pub use error::ScraperError;
pub use orchestrator::{
    Orchestrator, COMPREHENSIVE_MAX_RESULTS, COMPREHENSIVE_SOURCES, DEFAULT_SOURCES,
    QUICK_MAX_RESULTS, QUICK_SOURCES,
};
pub use providers::{BusinessSource, Provider};
pub use registry::SourceRegistry;
pub use result::{ScrapeRequest, ScrapeResult, SourceError, SourceErrorKind};
pub use settings::ScraperSettings;
pub use types::{RawBusiness, SearchQuery};
pub use validate::{validate, Rejection};

//! Provider adapters: one per canonical source key.

mod browser;
mod cards;
mod google_places;
mod jsonld;
mod justdial;
mod yellowpages;

use std::future::Future;

use clienthunt_core::SourceKey;

pub use browser::BrowserDirectoryProvider;
pub use google_places::GooglePlacesProvider;
pub use justdial::JustdialProvider;
pub use yellowpages::YellowPagesProvider;

use crate::error::ScraperError;
use crate::settings::ScraperSettings;
use crate::types::{RawBusiness, SearchQuery};

/// The one capability every source exposes: fetch up to `max_results`
/// listings for a location and category.
///
/// Implementations never invent rows. A blocked or empty upstream yields an
/// error or an empty `Vec`.
pub trait BusinessSource {
    fn key(&self) -> SourceKey;

    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<RawBusiness>, ScraperError>> + Send;
}

/// Closed set of adapters, selected by resolved key.
pub enum Provider {
    Justdial(JustdialProvider),
    GooglePlaces(GooglePlacesProvider),
    YellowPages(YellowPagesProvider),
    BrowserDirectory(BrowserDirectoryProvider),
}

impl Provider {
    /// Build the adapter registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the adapter's HTTP client cannot be built.
    pub fn for_key(key: SourceKey, settings: &ScraperSettings) -> Result<Self, ScraperError> {
        Ok(match key {
            SourceKey::JustdialReal => Provider::Justdial(JustdialProvider::new(settings)?),
            SourceKey::GoogleMapsApi => Provider::GooglePlaces(GooglePlacesProvider::new(settings)?),
            SourceKey::YellowpagesReal => Provider::YellowPages(YellowPagesProvider::new(settings)?),
            SourceKey::Playwright => {
                Provider::BrowserDirectory(BrowserDirectoryProvider::new(settings)?)
            }
        })
    }
}

impl BusinessSource for Provider {
    fn key(&self) -> SourceKey {
        match self {
            Provider::Justdial(_) => SourceKey::JustdialReal,
            Provider::GooglePlaces(_) => SourceKey::GoogleMapsApi,
            Provider::YellowPages(_) => SourceKey::YellowpagesReal,
            Provider::BrowserDirectory(_) => SourceKey::Playwright,
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawBusiness>, ScraperError> {
        match self {
            Provider::Justdial(p) => p.search(query).await,
            Provider::GooglePlaces(p) => p.search(query).await,
            Provider::YellowPages(p) => p.search(query).await,
            Provider::BrowserDirectory(p) => p.search(query).await,
        }
    }
}

//! Immutable mapping from canonical source key to provider adapter.

use std::collections::BTreeMap;

use clienthunt_core::SourceKey;

use crate::error::ScraperError;
use crate::providers::{BusinessSource, Provider};
use crate::settings::ScraperSettings;

/// Built once at startup and shared by reference; never mutated afterwards.
pub struct SourceRegistry {
    providers: BTreeMap<SourceKey, Provider>,
}

impl SourceRegistry {
    /// Register the given providers, keyed by the source each one serves.
    /// A later provider for the same key replaces an earlier one.
    #[must_use]
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.key(), p)).collect(),
        }
    }

    /// Register every canonical source.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if any adapter's HTTP client cannot be built.
    pub fn from_settings(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let providers = SourceKey::ALL
            .into_iter()
            .map(|key| Provider::for_key(key, settings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(providers))
    }

    /// Look up a provider by resolved key string.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Provider> {
        let key = key.parse::<SourceKey>().ok()?;
        self.providers.get(&key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = SourceKey> + '_ {
        self.providers.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

//! Cross-source duplicate suppression within one scrape request.

use std::collections::HashSet;

use clienthunt_core::BusinessRecord;

/// First record wins; later records with the same normalized name and
/// location are dropped.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `record` is the first with its key.
    pub fn accept(&mut self, record: &BusinessRecord) -> bool {
        self.seen.insert(record.dedup_key())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use clienthunt_core::{DataType, SourceKey};

    use super::*;

    fn record(name: &str, location: &str, source: SourceKey) -> BusinessRecord {
        BusinessRecord {
            name: name.to_string(),
            contact: None,
            address: Some("Agra".to_string()),
            website: None,
            category: String::new(),
            location: location.to_string(),
            latitude: None,
            longitude: None,
            source,
            scraped_at: Utc::now(),
            data_type: DataType::RealData,
        }
    }

    #[test]
    fn first_record_wins_across_sources() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&record("Agra Sweets", "Agra", SourceKey::JustdialReal)));
        assert!(!dedup.accept(&record("agra  SWEETS ", "agra", SourceKey::YellowpagesReal)));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn same_name_in_different_location_is_distinct() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&record("Agra Sweets", "Agra", SourceKey::JustdialReal)));
        assert!(dedup.accept(&record("Agra Sweets", "Delhi", SourceKey::JustdialReal)));
        assert_eq!(dedup.len(), 2);
    }
}

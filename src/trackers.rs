// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::errors::StoreError;
use crate::store::Store;

use rand::seq::IndexedRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerRecord {
    pub url: String,
    pub uses: u64,
    pub resolves: u64,
    pub ratio: f64,
}

impl TrackerRecord {
    fn record_use(&mut self, resolved: bool) {
        self.uses += 1;
        if resolved {
            self.resolves += 1;
        }
        self.ratio = self.resolves as f64 / self.uses as f64;
    }
}

/// In-memory view of the announce-endpoint table.
///
/// Endpoint selection is uniformly random rather than ratio-weighted: every
/// endpoint keeps getting re-evaluated, at the cost of some lookups landing
/// on historically weak trackers.
#[derive(Debug, Default)]
pub struct TrackerCatalog {
    records: Vec<TrackerRecord>,
}

impl TrackerCatalog {
    pub fn load(&mut self, store: &Store) -> Result<(), StoreError> {
        self.records = store.load_trackers()?;
        Ok(())
    }

    pub fn persist(&self, store: &mut Store) -> Result<(), StoreError> {
        store.upsert_trackers(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Picks `amount` distinct endpoint URLs at random, or every URL if the
    /// catalog is smaller than that.
    pub fn sample(&self, amount: usize) -> Vec<String> {
        self.records
            .choose_multiple(&mut rand::rng(), amount)
            .map(|record| record.url.clone())
            .collect()
    }

    /// Books a terminal lookup outcome against every endpoint the session
    /// was announced to.
    pub fn record_outcome(&mut self, session_urls: &[String], success: bool) {
        for record in &mut self.records {
            if session_urls.iter().any(|url| url == &record.url) {
                record.record_use(success);
            }
        }
    }

    #[cfg(test)]
    fn records(&self) -> &[TrackerRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fresh_record(url: &str) -> TrackerRecord {
        TrackerRecord {
            url: url.to_string(),
            uses: 0,
            resolves: 0,
            ratio: 0.0,
        }
    }

    fn catalog_with(urls: &[&str]) -> TrackerCatalog {
        TrackerCatalog {
            records: urls.iter().map(|url| fresh_record(url)).collect(),
        }
    }

    #[test]
    fn test_record_use_keeps_counters_consistent() {
        let mut record = fresh_record("udp://a/announce");
        assert_eq!(record.ratio, 0.0);

        record.record_use(true);
        record.record_use(false);
        record.record_use(false);

        assert_eq!(record.uses, 3);
        assert_eq!(record.resolves, 1);
        assert!(record.resolves <= record.uses);
        assert!((record.ratio - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sample_returns_distinct_urls() {
        let catalog = catalog_with(&["a", "b", "c", "d", "e"]);

        let sample = catalog.sample(3);
        assert_eq!(sample.len(), 3);
        let distinct: HashSet<_> = sample.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_sample_caps_at_catalog_size() {
        let catalog = catalog_with(&["a", "b"]);
        let sample = catalog.sample(5);
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn test_sample_of_empty_catalog() {
        let catalog = TrackerCatalog::default();
        assert!(catalog.sample(3).is_empty());
    }

    #[test]
    fn test_sample_eventually_covers_every_endpoint() {
        let catalog = catalog_with(&["a", "b", "c", "d", "e"]);

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            for url in catalog.sample(3) {
                seen.insert(url);
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_record_outcome_only_touches_session_urls() {
        let mut catalog = catalog_with(&["a", "b", "c"]);
        let session_urls = vec!["a".to_string(), "c".to_string()];

        catalog.record_outcome(&session_urls, true);
        catalog.record_outcome(&session_urls, false);

        let records = catalog.records();
        assert_eq!(records[0].uses, 2);
        assert_eq!(records[0].resolves, 1);
        assert_eq!(records[1].uses, 0);
        assert_eq!(records[1].resolves, 0);
        assert_eq!(records[2].uses, 2);
        assert_eq!(records[2].resolves, 1);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .import_trackers(&["udp://a/announce".to_string()])
            .unwrap();

        let mut catalog = TrackerCatalog::default();
        catalog.load(&store).unwrap();
        assert_eq!(catalog.len(), 1);

        catalog.record_outcome(&["udp://a/announce".to_string()], true);
        catalog.persist(&mut store).unwrap();

        let mut reloaded = TrackerCatalog::default();
        reloaded.load(&store).unwrap();
        assert_eq!(reloaded.records()[0].uses, 1);
        assert_eq!(reloaded.records()[0].resolves, 1);
    }
}

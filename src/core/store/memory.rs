//! In-memory store backend for testing.

use super::{ComparisonRecord, MethodStats, RecordStore};
use crate::core::identity::ImageIdentity;
use crate::core::strategy::Method;
use crate::error::StoreError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

type TripleKey = (String, String, Method);

/// In-memory store backend
///
/// Enforces the same ordered-triple uniqueness as the SQLite backend.
/// Useful for tests and scenarios where persistence isn't needed.
pub struct InMemoryStore {
    records: RwLock<HashMap<TripleKey, ComparisonRecord>>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn key(identity1: &ImageIdentity, identity2: &ImageIdentity, method: Method) -> TripleKey {
        (identity1.to_hex(), identity2.to_hex(), method)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryStore {
    fn lookup(
        &self,
        identity1: &ImageIdentity,
        identity2: &ImageIdentity,
        method: Method,
    ) -> Result<Option<f64>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;

        Ok(records
            .get(&Self::key(identity1, identity2, method))
            .map(|record| record.score))
    }

    fn insert(&self, record: ComparisonRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;

        let key = Self::key(&record.identity1, &record.identity2, record.method);
        match records.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
            Entry::Occupied(_) => Err(StoreError::DuplicateRecord {
                identity1: record.identity1.to_hex(),
                identity2: record.identity2.to_hex(),
                method: record.method.to_string(),
            }),
        }
    }

    fn stats(&self) -> Result<Vec<MethodStats>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;

        let mut grouped: HashMap<Method, Vec<f64>> = HashMap::new();
        for record in records.values() {
            grouped.entry(record.method).or_default().push(record.score);
        }

        let mut stats: Vec<MethodStats> = grouped
            .into_iter()
            .map(|(method, scores)| {
                let count = scores.len() as u64;
                let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                MethodStats {
                    method,
                    count,
                    min,
                    max,
                    mean,
                }
            })
            .collect();

        stats.sort_by_key(|s| s.method.as_token());
        Ok(stats)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.len() as u64)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::identity;

    fn record(loc1: &str, loc2: &str, method: Method, score: f64) -> ComparisonRecord {
        ComparisonRecord::new(identity(loc1), identity(loc2), method, score)
    }

    #[test]
    fn miss_returns_none() {
        let store = InMemoryStore::new();

        let result = store
            .lookup(&identity("a.jpg"), &identity("b.jpg"), Method::Histogram)
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn hit_returns_the_score() {
        let store = InMemoryStore::new();
        store
            .insert(record("a.jpg", "b.jpg", Method::Histogram, 0.42))
            .unwrap();

        let result = store
            .lookup(&identity("a.jpg"), &identity("b.jpg"), Method::Histogram)
            .unwrap();

        assert_eq!(result, Some(0.42));
    }

    #[test]
    fn ordered_pair_is_the_key() {
        let store = InMemoryStore::new();
        store
            .insert(record("a.jpg", "b.jpg", Method::Keypoint, 0.3))
            .unwrap();

        let reversed = store
            .lookup(&identity("b.jpg"), &identity("a.jpg"), Method::Keypoint)
            .unwrap();

        assert!(reversed.is_none());
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let store = InMemoryStore::new();
        store
            .insert(record("a.jpg", "b.jpg", Method::Perceptual, 1.0))
            .unwrap();

        let second = store.insert(record("a.jpg", "b.jpg", Method::Perceptual, 1.0));

        assert!(matches!(second, Err(StoreError::DuplicateRecord { .. })));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn stats_group_by_method() {
        let store = InMemoryStore::new();
        store
            .insert(record("a.jpg", "b.jpg", Method::Histogram, 0.0))
            .unwrap();
        store
            .insert(record("a.jpg", "c.jpg", Method::Histogram, 1.0))
            .unwrap();

        let stats = store.stats().unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].min, 0.0);
        assert_eq!(stats[0].max, 1.0);
        assert!((stats[0].mean - 0.5).abs() < 1e-9);
    }
}

//! # Comparator Module
//!
//! Orchestrates a comparison request end to end:
//! identity hashing, cache lookup, image loading on a miss, strategy
//! dispatch, and the cache write.
//!
//! A failed comparison never writes a record, so errors are never cached.
//! Two concurrent identical requests may both miss and both compute; the
//! store's uniqueness constraint resolves the race and the loser's insert
//! is treated as success.

use crate::core::dispatch::Dispatcher;
use crate::core::identity::identity;
use crate::core::loader::{DefaultLoader, ImageLoader};
use crate::core::store::{ComparisonRecord, InMemoryStore, MethodStats, RecordStore};
use crate::core::strategy::Method;
use crate::error::{Result, StoreError};
use std::time::Instant;
use tracing::debug;

/// Builder for a [`Comparator`]
pub struct ComparatorBuilder {
    loader: Option<Box<dyn ImageLoader>>,
    store: Option<Box<dyn RecordStore>>,
}

impl ComparatorBuilder {
    pub fn new() -> Self {
        Self {
            loader: None,
            store: None,
        }
    }

    /// Set the image loader
    pub fn loader(mut self, loader: Box<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the record store
    pub fn store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the comparator.
    ///
    /// Defaults: [`DefaultLoader`] and a non-persistent [`InMemoryStore`].
    pub fn build(self) -> Comparator {
        Comparator {
            loader: self.loader.unwrap_or_else(|| Box::new(DefaultLoader::new())),
            store: self.store.unwrap_or_else(|| Box::new(InMemoryStore::new())),
            dispatcher: Dispatcher::new(),
        }
    }
}

impl Default for ComparatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The comparison orchestrator
pub struct Comparator {
    loader: Box<dyn ImageLoader>,
    store: Box<dyn RecordStore>,
    dispatcher: Dispatcher,
}

impl Comparator {
    /// Create a builder
    pub fn builder() -> ComparatorBuilder {
        ComparatorBuilder::new()
    }

    /// Compare the images behind two source locators.
    ///
    /// Returns the cached score when the ordered triple has been computed
    /// before; otherwise loads both images, dispatches to the strategy and
    /// stores the result.
    pub fn compare(&self, locator1: &str, locator2: &str, method: Method) -> Result<f64> {
        let id1 = identity(locator1);
        let id2 = identity(locator2);

        if let Some(score) = self.store.lookup(&id1, &id2, method)? {
            debug!(%method, %id1, %id2, score, "cache hit");
            return Ok(score);
        }
        debug!(%method, %id1, %id2, "cache miss");

        let image1 = self.loader.load(locator1)?;
        let image2 = self.loader.load(locator2)?;

        let started = Instant::now();
        let score = self.dispatcher.dispatch(method, &image1, &image2)?;
        debug!(
            %method,
            score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed similarity"
        );

        match self
            .store
            .insert(ComparisonRecord::new(id1, id2, method, score))
        {
            Ok(()) => {}
            // Lost a race against a concurrent identical request; the
            // freshly computed score is still correct
            Err(StoreError::DuplicateRecord { .. }) => {
                debug!(%method, "duplicate record, concurrent computation won the race");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(score)
    }

    /// Per-method aggregates over all stored comparisons
    pub fn stats(&self) -> Result<Vec<MethodStats>> {
        Ok(self.store.stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, SimilarityError};
    use image::{GrayImage, ImageBuffer, Luma};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Loader that serves fixtures from memory and counts calls
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    impl CountingLoader {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl ImageLoader for CountingLoader {
        fn load(&self, locator: &str) -> std::result::Result<GrayImage, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match locator {
                "checker.png" => Ok(ImageBuffer::from_fn(64, 64, |x, y| {
                    Luma([if (x / 8 + y / 8) % 2 == 0 { 30 } else { 220 }])
                })),
                "skewed.png" => Ok(ImageBuffer::from_fn(64, 64, |x, y| {
                    Luma([((x * y) % 251) as u8])
                })),
                other => Err(LoadError::Decode {
                    locator: other.to_string(),
                    reason: "no such fixture".to_string(),
                }),
            }
        }
    }

    fn comparator_with_counter() -> (Comparator, Arc<AtomicUsize>) {
        let (loader, calls) = CountingLoader::new();
        let comparator = Comparator::builder().loader(Box::new(loader)).build();
        (comparator, calls)
    }

    #[test]
    fn self_comparison_with_phash_is_exactly_one() {
        let (comparator, _) = comparator_with_counter();

        let score = comparator
            .compare("checker.png", "checker.png", Method::Perceptual)
            .unwrap();

        assert_eq!(score, 1.0);
    }

    #[test]
    fn repeated_compare_is_idempotent_and_cached() {
        let (comparator, calls) = comparator_with_counter();

        let first = comparator
            .compare("checker.png", "skewed.png", Method::Histogram)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let second = comparator
            .compare("checker.png", "skewed.png", Method::Histogram)
            .unwrap();

        assert_eq!(first, second);
        // Cache hit performs zero image loads
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reversed_pair_is_not_served_from_cache() {
        let (comparator, calls) = comparator_with_counter();

        comparator
            .compare("checker.png", "skewed.png", Method::Histogram)
            .unwrap();
        comparator
            .compare("skewed.png", "checker.png", Method::Histogram)
            .unwrap();

        // Both orders computed: four loads total
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn load_failure_propagates_and_caches_nothing() {
        let (comparator, _) = comparator_with_counter();

        let result = comparator.compare("missing.png", "checker.png", Method::Perceptual);
        assert!(matches!(result, Err(SimilarityError::Load(_))));

        // A later request with a working pair of the same identity prefix
        // must not see a stale record; nothing was stored
        assert!(comparator.stats().unwrap().is_empty());
    }

    #[test]
    fn stats_reflect_stored_comparisons() {
        let (comparator, _) = comparator_with_counter();

        comparator
            .compare("checker.png", "skewed.png", Method::Perceptual)
            .unwrap();
        comparator
            .compare("checker.png", "checker.png", Method::Perceptual)
            .unwrap();

        let stats = comparator.stats().unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].method, Method::Perceptual);
        assert_eq!(stats[0].count, 2);
    }
}

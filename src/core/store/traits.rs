//! Store backend trait definition.

use super::{ComparisonRecord, MethodStats};
use crate::core::identity::ImageIdentity;
use crate::core::strategy::Method;
use crate::error::StoreError;
use std::sync::Arc;

/// Trait for result-store backends
pub trait RecordStore: Send + Sync {
    /// Look up the stored score for an ordered triple.
    ///
    /// Exact match only; side-effect free.
    fn lookup(
        &self,
        identity1: &ImageIdentity,
        identity2: &ImageIdentity,
        method: Method,
    ) -> Result<Option<f64>, StoreError>;

    /// Insert a new record.
    ///
    /// Fails with [`StoreError::DuplicateRecord`] when a record for the
    /// same triple already exists. Callers that lost a benign write race
    /// must treat that variant as success.
    fn insert(&self, record: ComparisonRecord) -> Result<(), StoreError>;

    /// Per-method aggregates over all stored records
    fn stats(&self) -> Result<Vec<MethodStats>, StoreError>;

    /// Total number of stored records
    fn count(&self) -> Result<u64, StoreError>;

    /// Remove every record
    fn clear(&self) -> Result<(), StoreError>;
}

/// A shared store handle is itself a store, so one backend can serve
/// several comparators (and concurrent requests) at once.
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn lookup(
        &self,
        identity1: &ImageIdentity,
        identity2: &ImageIdentity,
        method: Method,
    ) -> Result<Option<f64>, StoreError> {
        (**self).lookup(identity1, identity2, method)
    }

    fn insert(&self, record: ComparisonRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn stats(&self) -> Result<Vec<MethodStats>, StoreError> {
        (**self).stats()
    }

    fn count(&self) -> Result<u64, StoreError> {
        (**self).count()
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

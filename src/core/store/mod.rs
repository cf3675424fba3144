//! # Store Module
//!
//! Persists comparison scores keyed by `(identity1, identity2, method)`.
//!
//! The triple is **ordered**: `(A, B, method)` and `(B, A, method)` are
//! distinct records. Scores are deterministic per triple, so records are
//! never mutated, never deleted and never expire - a cached score can
//! only ever save redundant computation, not go stale.
//!
//! ## Backends
//! - `SqliteStore` - Persistent storage using SQLite
//! - `InMemoryStore` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::RecordStore;

use crate::core::identity::ImageIdentity;
use crate::core::strategy::Method;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted comparison result
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRecord {
    /// Identity of the first image, as submitted
    pub identity1: ImageIdentity,
    /// Identity of the second image, as submitted
    pub identity2: ImageIdentity,
    /// Method that produced the score
    pub method: Method,
    /// Similarity score in [0.0, 1.0]
    pub score: f64,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl ComparisonRecord {
    /// Create a record stamped with the current time
    pub fn new(identity1: ImageIdentity, identity2: ImageIdentity, method: Method, score: f64) -> Self {
        Self {
            identity1,
            identity2,
            method,
            score,
            created_at: Utc::now(),
        }
    }
}

/// Per-method aggregate over all stored records
#[derive(Debug, Clone, Serialize)]
pub struct MethodStats {
    pub method: Method,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

//! # Core Module
//!
//! The comparison engine, independent of any request boundary.
//!
//! ## Modules
//! - `identity` - Hashes source locators into content-identity tokens
//! - `loader` - Resolves locators to decoded grayscale rasters
//! - `strategy` - The three similarity strategies
//! - `dispatch` - Selects a strategy by method
//! - `store` - Persists scores keyed by the ordered identity triple
//! - `comparator` - Orchestrates the full request flow

pub mod comparator;
pub mod dispatch;
pub mod identity;
pub mod loader;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use comparator::{Comparator, ComparatorBuilder};
pub use dispatch::Dispatcher;
pub use identity::{identity, ImageIdentity};
pub use loader::{DefaultLoader, ImageLoader};
pub use store::{ComparisonRecord, InMemoryStore, MethodStats, RecordStore, SqliteStore};
pub use strategy::{Method, SimilarityStrategy};

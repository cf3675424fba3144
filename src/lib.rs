//! # Image Similarity
//!
//! Compares two images for visual similarity using one of three
//! interchangeable algorithms and caches results keyed by content
//! identity.
//!
//! ## Architecture
//! The library is split into a core engine (boundary-agnostic) and a thin
//! presentation layer:
//! - `core` - The comparison engine
//! - `error` - Error types
//! - `cli` - Command-line interface (in the binary)
//!
//! ## Methods
//! - `orb` - Keypoint matching: robust to scale, rotation and partial
//!   occlusion, most expensive
//! - `hist` - Histogram correlation: cheap global first-pass filter
//! - `phash` - Perceptual hashing: robust to recompression and resizing

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{Result, SimilarityError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}

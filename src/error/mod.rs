//! # Error Module
//!
//! Error types for the image similarity engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - locators, method tokens, what went wrong
//! - **Distinguishable messages** - the boundary layer maps each variant
//!   to a distinct client-facing message

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Image load error: {0}")]
    Load(#[from] LoadError),

    #[error("Comparison error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown method `{token}`. Use `orb`, `hist`, or `phash`")]
    UnknownMethod { token: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while resolving a source locator to a decoded image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch image from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Fetching {url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {locator}: {reason}")]
    Decode { locator: String, reason: String },

    #[error("Image is empty: {locator}")]
    EmptyImage { locator: String },
}

/// Errors raised by a similarity strategy on otherwise-valid decoded images
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Computation failed: {0}")]
    ComputationFailed(String),
}

/// Errors raised by the result store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("A record for ({identity1}, {identity2}, {method}) already exists")]
    DuplicateRecord {
        identity1: String,
        identity2: String,
        method: String,
    },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SimilarityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_names_the_token() {
        let error = SimilarityError::UnknownMethod {
            token: "sift".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("sift"));
        assert!(message.contains("phash"));
    }

    #[test]
    fn load_error_includes_locator() {
        let error = LoadError::Decode {
            locator: "https://example.com/a.jpg".to_string(),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("https://example.com/a.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn duplicate_record_names_the_triple() {
        let error = StoreError::DuplicateRecord {
            identity1: "aa".to_string(),
            identity2: "bb".to_string(),
            method: "hist".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("aa"));
        assert!(message.contains("hist"));
    }
}

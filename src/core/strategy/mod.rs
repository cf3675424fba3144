//! # Strategy Module
//!
//! The three similarity strategies and their shared contract.
//!
//! ## Strategies
//! - **Keypoint (`orb`)** - FAST corners + BRIEF binary descriptors with
//!   cross-checked Hamming matching. Robust to scale, rotation and partial
//!   occlusion; the most expensive of the three.
//! - **Histogram (`hist`)** - 256-bin intensity histogram correlation.
//!   Cheap, global, insensitive to spatial layout.
//! - **Perceptual (`phash`)** - DCT-derived 64-bit fingerprint compared by
//!   Hamming distance. Robust to recompression and resizing, blind to
//!   localized changes.
//!
//! Every strategy returns a score in `[0.0, 1.0]`.

mod histogram;
mod keypoint;
mod perceptual;
pub mod resize;

pub use histogram::HistogramStrategy;
pub use keypoint::KeypointStrategy;
pub use perceptual::PerceptualStrategy;

use crate::error::{SimilarityError, StrategyError};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The valid comparison methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Keypoint matching (wire token `orb`)
    #[serde(rename = "orb")]
    Keypoint,
    /// Histogram correlation (wire token `hist`)
    #[serde(rename = "hist")]
    Histogram,
    /// Perceptual hashing (wire token `phash`)
    #[serde(rename = "phash")]
    Perceptual,
}

impl Method {
    /// The wire token accepted at the request boundary
    pub fn as_token(&self) -> &'static str {
        match self {
            Method::Keypoint => "orb",
            Method::Histogram => "hist",
            Method::Perceptual => "phash",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Method {
    type Err = SimilarityError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "orb" => Ok(Method::Keypoint),
            "hist" => Ok(Method::Histogram),
            "phash" => Ok(Method::Perceptual),
            other => Err(SimilarityError::UnknownMethod {
                token: other.to_string(),
            }),
        }
    }
}

/// Strategy trait for scoring the similarity of two decoded images
pub trait SimilarityStrategy: Send + Sync {
    /// Compare two grayscale rasters.
    ///
    /// The result is always in `[0.0, 1.0]`. Fails with [`StrategyError`]
    /// only when the computation cannot proceed on otherwise-valid input.
    fn compare(&self, a: &GrayImage, b: &GrayImage) -> Result<f64, StrategyError>;

    /// The method this strategy implements
    fn method(&self) -> Method;
}

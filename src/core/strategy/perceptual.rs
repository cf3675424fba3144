//! Perceptual hashing strategy (`phash`).
//!
//! Computes a 64-bit DCT-derived fingerprint per image via the
//! image_hasher crate, takes the Hamming distance between the two
//! fingerprints and returns `1 - distance / 64`.
//!
//! Identical rasters hash identically, so comparing an image with itself
//! scores exactly 1.0.

use super::{Method, SimilarityStrategy};
use crate::error::StrategyError;
use image::GrayImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};

/// Fingerprint bit length (8x8 hash)
const FINGERPRINT_BITS: u32 = 64;

/// Perceptual hashing strategy
pub struct PerceptualStrategy {
    hasher: Hasher,
}

impl PerceptualStrategy {
    pub fn new() -> Self {
        // 8x8 mean hash over the DCT low-frequency block: the classic
        // pHash construction
        let hasher = HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hasher }
    }

    /// Compute the 64-bit fingerprint of a raster
    fn fingerprint(&self, image: &GrayImage) -> Result<u64, StrategyError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(StrategyError::DegenerateInput(
                "empty raster has no fingerprint".to_string(),
            ));
        }

        let hash = self.hasher.hash_image(image);
        let bytes = hash.as_bytes();
        if bytes.len() != 8 {
            return Err(StrategyError::ComputationFailed(format!(
                "unexpected fingerprint length {}",
                bytes.len()
            )));
        }

        let mut words = [0u8; 8];
        words.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(words))
    }
}

impl Default for PerceptualStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityStrategy for PerceptualStrategy {
    fn compare(&self, a: &GrayImage, b: &GrayImage) -> Result<f64, StrategyError> {
        let fingerprint_a = self.fingerprint(a)?;
        let fingerprint_b = self.fingerprint(b)?;

        let distance = (fingerprint_a ^ fingerprint_b).count_ones();

        Ok(1.0 - distance as f64 / FINGERPRINT_BITS as f64)
    }

    fn method(&self) -> Method {
        Method::Perceptual
    }
}

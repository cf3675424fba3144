//! Histogram correlation strategy (`hist`).
//!
//! Computes a 256-bin intensity histogram per image, L2-normalizes each,
//! and returns the Pearson correlation coefficient between the two
//! normalized histograms, clamped to `[0.0, 1.0]`.
//!
//! Raw correlation lies in [-1, 1]; anti-correlated histograms clamp to
//! 0.0 so the system-wide score contract holds for every method.

use super::{Method, SimilarityStrategy};
use crate::error::StrategyError;
use image::GrayImage;

/// Number of intensity bins
const BINS: usize = 256;

/// Histogram correlation strategy
pub struct HistogramStrategy;

impl HistogramStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HistogramStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityStrategy for HistogramStrategy {
    fn compare(&self, a: &GrayImage, b: &GrayImage) -> Result<f64, StrategyError> {
        let hist_a = normalized_histogram(a)?;
        let hist_b = normalized_histogram(b)?;

        let correlation = pearson(&hist_a, &hist_b)?;

        Ok(correlation.clamp(0.0, 1.0))
    }

    fn method(&self) -> Method {
        Method::Histogram
    }
}

/// 256-bin intensity histogram, L2-normalized
fn normalized_histogram(image: &GrayImage) -> Result<[f64; BINS], StrategyError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(StrategyError::DegenerateInput(
            "empty raster has no histogram".to_string(),
        ));
    }

    let mut histogram = [0.0f64; BINS];
    for pixel in image.as_raw() {
        histogram[*pixel as usize] += 1.0;
    }

    let norm = histogram.iter().map(|c| c * c).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(StrategyError::DegenerateInput(
            "histogram has zero mass".to_string(),
        ));
    }

    for bin in histogram.iter_mut() {
        *bin /= norm;
    }

    Ok(histogram)
}

/// Pearson correlation coefficient between two equal-length vectors.
///
/// Fails when either vector has zero variance (the coefficient is
/// undefined), which for a histogram means a perfectly uniform intensity
/// distribution.
fn pearson(a: &[f64; BINS], b: &[f64; BINS]) -> Result<f64, StrategyError> {
    let n = BINS as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        variance_a += dx * dx;
        variance_b += dy * dy;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 {
        return Err(StrategyError::DegenerateInput(
            "histogram has zero variance".to_string(),
        ));
    }

    Ok(covariance / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn solid(value: u8) -> GrayImage {
        ImageBuffer::from_pixel(64, 64, Luma([value]))
    }

    /// Every intensity 0..=255 exactly once per row: all bins equal
    fn uniform() -> GrayImage {
        ImageBuffer::from_fn(256, 4, |x, _| Luma([x as u8]))
    }

    /// Skewed, non-uniform intensity distribution
    fn skewed() -> GrayImage {
        ImageBuffer::from_fn(64, 64, |x, y| Luma([((x * y) % 251) as u8]))
    }

    #[test]
    fn identical_images_correlate_perfectly() {
        let strategy = HistogramStrategy::new();
        let image = skewed();

        let score = strategy.compare(&image, &image).unwrap();

        assert!((score - 1.0).abs() < 1e-9, "score was {}", score);
    }

    #[test]
    fn same_distribution_different_layout_correlates_perfectly() {
        let strategy = HistogramStrategy::new();
        let a = ImageBuffer::from_fn(64, 64, |x, y| Luma([if (x + y) % 2 == 0 { 10 } else { 200 }]));
        let b = ImageBuffer::from_fn(64, 64, |x, _| Luma([if x < 32 { 10 } else { 200 }]));

        // Same pixel-value multiset arranged differently
        let score = strategy.compare(&a, &b).unwrap();

        assert!((score - 1.0).abs() < 1e-9, "score was {}", score);
    }

    #[test]
    fn disjoint_distributions_clamp_to_zero_or_low() {
        let strategy = HistogramStrategy::new();
        let dark = solid(10);
        let bright = solid(245);

        let score = strategy.compare(&dark, &bright).unwrap();

        // Two spikes in different bins are nearly uncorrelated; any
        // negative correlation clamps to zero
        assert!((0.0..=1.0).contains(&score));
        assert!(score < 0.1, "score was {}", score);
    }

    #[test]
    fn score_is_always_within_bounds() {
        let strategy = HistogramStrategy::new();
        let pairs = [
            (solid(0), solid(255)),
            (skewed(), solid(128)),
            (skewed(), solid(0)),
        ];

        for (a, b) in &pairs {
            let score = strategy.compare(a, b).unwrap();
            assert!((0.0..=1.0).contains(&score), "score was {}", score);
        }
    }

    #[test]
    fn histogram_is_l2_normalized() {
        let histogram = normalized_histogram(&skewed()).unwrap();
        let norm: f64 = histogram.iter().map(|c| c * c).sum();

        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_histogram_is_degenerate() {
        // All 256 bins equal: zero variance, correlation undefined
        let strategy = HistogramStrategy::new();

        let result = strategy.compare(&uniform(), &skewed());

        assert!(matches!(
            result,
            Err(StrategyError::DegenerateInput(_))
        ));
    }
}

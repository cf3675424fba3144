//! # Dispatch Module
//!
//! Maps a [`Method`] to its strategy and invokes it.
//!
//! The dispatcher owns a constructed-once, read-only table of the three
//! stateless strategy values. Method validation happens at the boundary
//! when the token is parsed into the enum; the match here is exhaustive,
//! so an out-of-set value cannot reach a strategy.

use crate::core::strategy::{
    HistogramStrategy, KeypointStrategy, Method, PerceptualStrategy, SimilarityStrategy,
};
use crate::error::StrategyError;
use image::GrayImage;

/// Read-only strategy table keyed by [`Method`]
pub struct Dispatcher {
    keypoint: KeypointStrategy,
    histogram: HistogramStrategy,
    perceptual: PerceptualStrategy,
}

impl Dispatcher {
    /// Construct the table. Strategies hold no mutable state, so one
    /// dispatcher serves any number of concurrent comparisons.
    pub fn new() -> Self {
        Self {
            keypoint: KeypointStrategy::new(),
            histogram: HistogramStrategy::new(),
            perceptual: PerceptualStrategy::new(),
        }
    }

    /// Invoke the strategy for `method` on two decoded images
    pub fn dispatch(
        &self,
        method: Method,
        a: &GrayImage,
        b: &GrayImage,
    ) -> Result<f64, StrategyError> {
        self.strategy(method).compare(a, b)
    }

    /// The strategy instance behind a method
    pub fn strategy(&self, method: Method) -> &dyn SimilarityStrategy {
        match method {
            Method::Keypoint => &self.keypoint,
            Method::Histogram => &self.histogram,
            Method::Perceptual => &self.perceptual,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn fixture() -> GrayImage {
        ImageBuffer::from_fn(64, 64, |x, y| Luma([((x * 3 + y * 5) % 251) as u8]))
    }

    #[test]
    fn every_method_reaches_its_strategy() {
        let dispatcher = Dispatcher::new();

        assert_eq!(
            dispatcher.strategy(Method::Keypoint).method(),
            Method::Keypoint
        );
        assert_eq!(
            dispatcher.strategy(Method::Histogram).method(),
            Method::Histogram
        );
        assert_eq!(
            dispatcher.strategy(Method::Perceptual).method(),
            Method::Perceptual
        );
    }

    #[test]
    fn dispatch_produces_bounded_scores() {
        let dispatcher = Dispatcher::new();
        let image = fixture();

        for method in [Method::Keypoint, Method::Histogram, Method::Perceptual] {
            let score = dispatcher.dispatch(method, &image, &image).unwrap();
            assert!(
                (0.0..=1.0).contains(&score),
                "{} scored {}",
                method,
                score
            );
        }
    }
}

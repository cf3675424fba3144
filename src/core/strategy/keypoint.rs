//! Keypoint matching strategy (`orb`).
//!
//! How it works:
//! 1. Detect up to 500 FAST-9 corners per image (strongest first, after
//!    non-maximum suppression)
//! 2. Compute a 256-bit BRIEF binary descriptor for each corner from a
//!    box-smoothed patch, using a fixed pseudorandom sampling pattern
//! 3. Match descriptors between the two sets by brute-force nearest
//!    neighbour under Hamming distance with a strict cross-check: a match
//!    is accepted only if each descriptor is the other's best match in
//!    both directions
//! 4. Score = matched_pairs / max(keypoints_a, keypoints_b)
//!
//! If either image yields zero descriptors the score is defined as 0.0,
//! not an error: an image with no distinguishable features cannot match
//! anything.
//!
//! Images larger than 1024 px on the long side are downscaled first to
//! bound detection cost.

use super::resize::downscale_to_fit;
use super::{Method, SimilarityStrategy};
use crate::error::StrategyError;
use image::GrayImage;

/// Maximum number of keypoints retained per image
const MAX_KEYPOINTS: usize = 500;

/// FAST intensity threshold
const FAST_THRESHOLD: i16 = 20;

/// Minimum contiguous arc length for a FAST-9 corner
const FAST_ARC: usize = 9;

/// Long-side cap applied before detection
const MAX_SIDE: u32 = 1024;

/// Keypoints closer than this to any border are discarded so that every
/// BRIEF sample (offset <= 13, smoothing window +/-2) stays in bounds
const BORDER_MARGIN: u32 = 16;

/// BRIEF sampling offsets are drawn from [-PATTERN_SPREAD, PATTERN_SPREAD]
const PATTERN_SPREAD: i64 = 13;

/// Number of descriptor bits (four u64 words)
const DESCRIPTOR_BITS: usize = 256;

/// Bresenham circle of radius 3, the 16 FAST test pixels in ring order
const FAST_CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// A detected corner with its FAST score
#[derive(Debug, Clone, Copy)]
struct Keypoint {
    x: u32,
    y: u32,
    score: u32,
}

/// 256-bit binary descriptor
type Descriptor = [u64; 4];

/// Keypoint matching strategy
pub struct KeypointStrategy {
    /// Fixed BRIEF sampling pattern: (dx1, dy1, dx2, dy2) per bit
    pattern: Vec<(i32, i32, i32, i32)>,
}

impl KeypointStrategy {
    pub fn new() -> Self {
        Self {
            pattern: sampling_pattern(),
        }
    }

    /// Detect corners and describe them. Returns one descriptor per
    /// surviving keypoint.
    fn extract(&self, image: &GrayImage) -> Result<Vec<Descriptor>, StrategyError> {
        let resized;
        let image = match downscale_to_fit(image, MAX_SIDE)? {
            Some(small) => {
                resized = small;
                &resized
            }
            None => image,
        };

        let keypoints = detect_fast(image);
        if keypoints.is_empty() {
            return Ok(Vec::new());
        }

        let smoothed = Smoothed::new(image);
        let descriptors = keypoints
            .iter()
            .map(|kp| self.describe(&smoothed, kp))
            .collect();

        Ok(descriptors)
    }

    /// Compute the BRIEF descriptor for one keypoint
    fn describe(&self, smoothed: &Smoothed, kp: &Keypoint) -> Descriptor {
        let mut descriptor = [0u64; 4];

        for (bit, &(dx1, dy1, dx2, dy2)) in self.pattern.iter().enumerate() {
            let p1 = smoothed.sample(kp.x as i32 + dx1, kp.y as i32 + dy1);
            let p2 = smoothed.sample(kp.x as i32 + dx2, kp.y as i32 + dy2);

            if p1 < p2 {
                descriptor[bit / 64] |= 1u64 << (bit % 64);
            }
        }

        descriptor
    }
}

impl Default for KeypointStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityStrategy for KeypointStrategy {
    fn compare(&self, a: &GrayImage, b: &GrayImage) -> Result<f64, StrategyError> {
        // The two extractions are independent and CPU-bound
        let (descriptors_a, descriptors_b) =
            rayon::join(|| self.extract(a), || self.extract(b));
        let descriptors_a = descriptors_a?;
        let descriptors_b = descriptors_b?;

        if descriptors_a.is_empty() || descriptors_b.is_empty() {
            return Ok(0.0);
        }

        let matches = cross_checked_matches(&descriptors_a, &descriptors_b);
        let denominator = descriptors_a.len().max(descriptors_b.len());

        Ok(matches as f64 / denominator as f64)
    }

    fn method(&self) -> Method {
        Method::Keypoint
    }
}

/// Detect FAST-9 corners with non-maximum suppression, strongest first,
/// capped at MAX_KEYPOINTS.
fn detect_fast(image: &GrayImage) -> Vec<Keypoint> {
    let (width, height) = image.dimensions();
    if width <= 2 * BORDER_MARGIN || height <= 2 * BORDER_MARGIN {
        return Vec::new();
    }

    let raw = image.as_raw();
    let w = width as usize;
    let mut scores = vec![0u32; w * height as usize];

    for y in BORDER_MARGIN..height - BORDER_MARGIN {
        for x in BORDER_MARGIN..width - BORDER_MARGIN {
            let center = raw[y as usize * w + x as usize] as i16;
            let bright = center + FAST_THRESHOLD;
            let dark = center - FAST_THRESHOLD;

            let ring: [i16; 16] = std::array::from_fn(|i| {
                let (dx, dy) = FAST_CIRCLE[i];
                raw[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize] as i16
            });

            // Quick reject on the four compass points: any 9-long arc
            // covers at least two of them on the same side
            let compass = [ring[0], ring[4], ring[8], ring[12]];
            let brighter = compass.iter().filter(|&&p| p > bright).count();
            let darker = compass.iter().filter(|&&p| p < dark).count();
            if brighter < 2 && darker < 2 {
                continue;
            }

            if let Some(score) = fast_score(&ring, bright, dark, center) {
                scores[y as usize * w + x as usize] = score;
            }
        }
    }

    // Non-maximum suppression over the 3x3 neighbourhood
    let mut keypoints = Vec::new();
    for y in BORDER_MARGIN..height - BORDER_MARGIN {
        for x in BORDER_MARGIN..width - BORDER_MARGIN {
            let score = scores[y as usize * w + x as usize];
            if score == 0 {
                continue;
            }

            let is_max = (-1..=1).all(|dy: i32| {
                (-1..=1).all(|dx: i32| {
                    if dx == 0 && dy == 0 {
                        return true;
                    }
                    let neighbour =
                        scores[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
                    score > neighbour || (score == neighbour && (dy < 0 || (dy == 0 && dx < 0)))
                })
            });

            if is_max {
                keypoints.push(Keypoint { x, y, score });
            }
        }
    }

    keypoints.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    keypoints.truncate(MAX_KEYPOINTS);
    keypoints
}

/// Check the 16-pixel ring for a contiguous arc of at least FAST_ARC
/// pixels all brighter than `bright` or all darker than `dark`. Returns
/// the corner score (sum of absolute threshold excesses) or None.
fn fast_score(ring: &[i16; 16], bright: i16, dark: i16, center: i16) -> Option<u32> {
    let mut found = false;

    for side in [true, false] {
        let passes = |p: i16| if side { p > bright } else { p < dark };

        let mut run = 0usize;
        let mut best_run = 0usize;
        // Walk the ring twice to handle wrap-around arcs
        for i in 0..32 {
            if passes(ring[i % 16]) {
                run += 1;
                best_run = best_run.max(run);
                if best_run >= FAST_ARC {
                    break;
                }
            } else {
                run = 0;
            }
        }

        if best_run >= FAST_ARC {
            found = true;
            break;
        }
    }

    if !found {
        return None;
    }

    let threshold = FAST_THRESHOLD as i32;
    let score: i32 = ring
        .iter()
        .map(|&p| ((p as i32 - center as i32).abs() - threshold).max(0))
        .sum();

    Some(score as u32)
}

/// Box-smoothed view of a raster backed by an integral image.
///
/// `sample` returns the mean of the 5x5 window centred on the pixel.
/// Callers must keep samples at least 2 px inside the raster; the
/// BORDER_MARGIN and PATTERN_SPREAD constants guarantee that.
struct Smoothed {
    integral: Vec<u64>,
    width: usize,
}

impl Smoothed {
    fn new(image: &GrayImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = image.as_raw();

        // (width+1) x (height+1) summed-area table
        let stride = width + 1;
        let mut integral = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += raw[y * width + x] as u64;
                integral[(y + 1) * stride + (x + 1)] = integral[y * stride + (x + 1)] + row_sum;
            }
        }

        Self { integral, width }
    }

    fn sample(&self, x: i32, y: i32) -> u8 {
        let stride = self.width + 1;
        let x0 = (x - 2) as usize;
        let y0 = (y - 2) as usize;
        let x1 = (x + 3) as usize;
        let y1 = (y + 3) as usize;

        let sum = self.integral[y1 * stride + x1] + self.integral[y0 * stride + x0]
            - self.integral[y0 * stride + x1]
            - self.integral[y1 * stride + x0];

        (sum / 25) as u8
    }
}

/// Generate the fixed BRIEF sampling pattern.
///
/// Deterministic xorshift so every strategy instance (and every run)
/// produces identical descriptors for identical rasters.
fn sampling_pattern() -> Vec<(i32, i32, i32, i32)> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let mut next_offset = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let span = 2 * PATTERN_SPREAD + 1;
        ((state % span as u64) as i64 - PATTERN_SPREAD) as i32
    };

    (0..DESCRIPTOR_BITS)
        .map(|_| (next_offset(), next_offset(), next_offset(), next_offset()))
        .collect()
}

/// Hamming distance between two 256-bit descriptors
fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// Index of the nearest descriptor in `candidates` for each query
fn nearest(queries: &[Descriptor], candidates: &[Descriptor]) -> Vec<usize> {
    queries
        .iter()
        .map(|query| {
            let mut best_index = 0;
            let mut best_distance = u32::MAX;
            for (index, candidate) in candidates.iter().enumerate() {
                let distance = hamming(query, candidate);
                if distance < best_distance {
                    best_distance = distance;
                    best_index = index;
                }
            }
            best_index
        })
        .collect()
}

/// Count mutual-best matches between the two descriptor sets
fn cross_checked_matches(a: &[Descriptor], b: &[Descriptor]) -> usize {
    let forward = nearest(a, b);
    let backward = nearest(b, a);

    forward
        .iter()
        .enumerate()
        .filter(|&(i, &j)| backward[j] == i)
        .count()
}

//! Fast SIMD-accelerated downscaling of grayscale rasters.
//!
//! Uses the fast_image_resize crate which automatically picks AVX2/NEON
//! SIMD when available.

use crate::error::StrategyError;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::GrayImage;

/// Downscale a grayscale raster so its long side is at most `max_side`.
///
/// Returns a copy at the reduced size, or `None` if the raster is already
/// within bounds. Aspect ratio is preserved.
pub fn downscale_to_fit(
    image: &GrayImage,
    max_side: u32,
) -> Result<Option<GrayImage>, StrategyError> {
    let (width, height) = image.dimensions();
    let long_side = width.max(height);

    if long_side <= max_side {
        return Ok(None);
    }

    let scale = max_side as f64 / long_side as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    Ok(Some(resize(image, new_width, new_height)?))
}

/// Resize a grayscale raster to exact dimensions using bilinear filtering
pub fn resize(image: &GrayImage, width: u32, height: u32) -> Result<GrayImage, StrategyError> {
    if image.width() == 0 || image.height() == 0 || width == 0 || height == 0 {
        return Err(StrategyError::DegenerateInput(
            "cannot resize an empty raster".to_string(),
        ));
    }

    let src = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8,
    )
    .map_err(|e| StrategyError::ComputationFailed(format!("resize source: {}", e)))?;

    let mut dst = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| StrategyError::ComputationFailed(format!("resize failed: {}", e)))?;

    GrayImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| StrategyError::ComputationFailed("resize output buffer".to_string()))
}

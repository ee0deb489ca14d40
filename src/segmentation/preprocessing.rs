use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::definitions::Image;
use imageproc::distance_transform::{euclidean_squared_distance_transform, Norm};
use imageproc::filter::separable_filter_equal;

use crate::error::SegmentationError;
use crate::models::ThresholdMode;

/// Single-channel and three-channel views of an input image
pub fn normalize_channels(img: &DynamicImage) -> (GrayImage, RgbImage) {
    (img.to_luma8(), img.to_rgb8())
}

/// Global threshold; `None` picks the level with Otsu's method.
pub fn threshold(gray: &GrayImage, value: Option<u8>, mode: ThresholdMode) -> GrayImage {
    let level = value.unwrap_or_else(|| otsu_level(gray));
    let (width, height) = gray.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([mode.apply(gray.get_pixel(x, y)[0] > level)])
    })
}

/// Threshold each pixel against the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood minus `constant`.
///
/// The Gaussian sigma follows the usual kernel-size rule,
/// `0.3 * ((block_size - 1) / 2 - 1) + 0.8`. Borders replicate the edge pixel.
pub fn adaptive_threshold(
    gray: &GrayImage,
    block_size: u32,
    constant: i32,
    mode: ThresholdMode,
) -> Result<GrayImage, SegmentationError> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(SegmentationError::InvalidParameter(format!(
            "block size must be odd and at least 3, got {block_size}"
        )));
    }
    let mean = local_gaussian_mean(gray, block_size);

    let (width, height) = gray.dimensions();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let src = gray.get_pixel(x, y)[0] as i32;
        let local = mean.get_pixel(x, y)[0].round() as i32;
        Luma([mode.apply(src > local - constant)])
    }))
}

/// Normalized Gaussian kernel with exactly `size` taps.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size - 1) as f32 * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

fn local_gaussian_mean(gray: &GrayImage, block_size: u32) -> Image<Luma<f32>> {
    let (width, height) = gray.dimensions();
    // filter in f32 so the mean is rounded once instead of truncated per pass
    let values: Image<Luma<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([gray.get_pixel(x, y)[0] as f32]));
    separable_filter_equal(&values, &gaussian_kernel(block_size))
}

/// Erosion by a 3x3 square, repeated `iterations` times.
pub fn erode(binary: &GrayImage, iterations: u8) -> GrayImage {
    imageproc::morphology::erode(binary, Norm::LInf, iterations)
}

/// Dilation by a 3x3 square, repeated `iterations` times.
pub fn dilate(binary: &GrayImage, iterations: u8) -> GrayImage {
    imageproc::morphology::dilate(binary, Norm::LInf, iterations)
}

/// Erosion followed by dilation, each `iterations` times; removes specks
/// smaller than the structuring element.
pub fn opening(binary: &GrayImage, iterations: u8) -> GrayImage {
    dilate(&erode(binary, iterations), iterations)
}

/// Euclidean distance from each non-zero pixel to the nearest zero pixel.
///
/// Zero pixels map to 0. An image without zero pixels maps to `f64::MAX`.
pub fn distance_transform(binary: &GrayImage) -> Image<Luma<f64>> {
    let (width, height) = binary.dimensions();
    // the transform measures distance to non-zero pixels, so flip the mask
    let background = GrayImage::from_fn(width, height, |x, y| {
        Luma([if binary.get_pixel(x, y)[0] == 0 { 255 } else { 0 }])
    });
    let mut dist = euclidean_squared_distance_transform(&background);
    for p in dist.pixels_mut() {
        p[0] = if p[0].is_finite() { p[0].sqrt() } else { f64::MAX };
    }
    dist
}

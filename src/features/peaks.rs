use image::{GrayImage, Luma, RgbImage};
use imageproc::stats::histogram;
use palette::{IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

use crate::config::{ColourConfig, PeakConfig};
use crate::models::ThresholdMode;
use crate::segmentation::preprocessing::threshold;

/// Most populated intensity in `[range.lower, range.upper)`, first on ties.
pub fn histogram_peak(gray: &GrayImage, range: PeakConfig) -> Option<u8> {
    let counts = &histogram(gray).channels[0];
    let upper = range.upper.min(256) as usize;
    (range.lower as usize..upper)
        .rev()
        .max_by_key(|&bin| counts[bin])
        .map(|bin| bin as u8)
}

/// Colours `find_colour` can isolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetColour {
    Blue,
}

/// b* channel of CIE L*a*b*, offset into 0..=255 the way 8-bit LAB images
/// are stored.
pub fn lab_b_channel(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let lab: Lab = Srgb::new(r, g, b).into_format::<f32>().into_color();
        Luma([(lab.b + 128.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Mask of pixels noticeably more `colour` than the image's dominant hue.
///
/// The b* histogram peak marks the dominant colour; pixels at least
/// `config.offset` below it (bluer) are set to 255. Working in LAB keeps this
/// reasonably stable under lighting changes. `None` when `config.peak` is an
/// empty range.
pub fn find_colour(rgb: &RgbImage, colour: TargetColour, config: ColourConfig) -> Option<GrayImage> {
    match colour {
        TargetColour::Blue => {
            let b = lab_b_channel(rgb);
            let Some(peak) = histogram_peak(&b, config.peak) else {
                log::warn!(
                    "empty peak range [{}, {}), no colour threshold",
                    config.peak.lower,
                    config.peak.upper
                );
                return None;
            };
            log::debug!("b* peak at {peak}, threshold {}", peak.saturating_sub(config.offset));
            Some(threshold(&b, Some(peak.saturating_sub(config.offset)), ThresholdMode::BinaryInverted))
        }
    }
}

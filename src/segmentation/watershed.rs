use std::collections::VecDeque;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use crate::config::WatershedConfig;
use crate::error::SegmentationError;
use crate::features::components::{connected_components, Connectivity};
use crate::models::{LabelMap, BOUNDARY_LABEL};

use super::preprocessing::{adaptive_threshold, dilate, distance_transform, normalize_channels, opening};

const IN_QUEUE: i32 = -2;

/// Label assigned to everything outside the dilated foreground.
pub const BACKGROUND_REGION: i32 = 1;

/// Result of `watershed`.
#[derive(Debug, Clone)]
pub struct WatershedOutput {
    /// Input drawn in colour with region boundaries painted over it
    pub annotated: RgbImage,
    /// Flooded markers: 1 is background, 2.. are objects, -1 boundaries
    pub labels: LabelMap,
    /// Number of object seeds found
    pub seeds: usize,
}

impl WatershedOutput {
    /// 255 wherever an object region (label > 1) was flooded.
    pub fn region_mask(&self) -> GrayImage {
        let (width, height) = self.labels.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            Luma([if self.labels.get_pixel(x, y)[0] > BACKGROUND_REGION { 255 } else { 0 }])
        })
    }
}

/// Intermediate masks of the seed construction.
#[derive(Debug, Clone)]
pub struct Markers {
    pub binary: GrayImage,
    pub opened: GrayImage,
    pub sure_background: GrayImage,
    pub sure_foreground: GrayImage,
    pub markers: LabelMap,
    pub seeds: usize,
}

/// Build watershed seeds from a grayscale image.
///
/// Binarize adaptively, open away specks, grow the result for a generous
/// background estimate and keep pixels far from any zero pixel as sure
/// foreground. Foreground components become labels 2.., the rest of the
/// image label 1, and the band between the two estimates label 0.
pub fn build_markers(gray: &GrayImage, config: &WatershedConfig) -> Result<Markers, SegmentationError> {
    if !(config.watershed_threshold >= 0.0) {
        return Err(SegmentationError::InvalidParameter(format!(
            "watershed threshold must be non-negative, got {}",
            config.watershed_threshold
        )));
    }

    let binary = adaptive_threshold(gray, config.block_size, config.constant, config.mode)?;
    let opened = opening(&binary, config.opening_iterations);
    let sure_background = dilate(&opened, config.background_dilation);

    let dist = distance_transform(&opened);
    let (width, height) = gray.dimensions();
    let sure_foreground = GrayImage::from_fn(width, height, |x, y| {
        Luma([if dist.get_pixel(x, y)[0] > config.watershed_threshold { 255 } else { 0 }])
    });

    let components = connected_components(&sure_foreground, Connectivity::Eight);
    let seeds = components.num_labels() - 1;
    let mut markers = components.labels;
    for (x, y, label) in markers.enumerate_pixels_mut() {
        let unknown = sure_background.get_pixel(x, y)[0] > 0 && sure_foreground.get_pixel(x, y)[0] == 0;
        label[0] = if unknown { 0 } else { label[0] + 1 };
    }

    log::debug!("{seeds} watershed seeds on {width}x{height} image");
    Ok(Markers {
        binary,
        opened,
        sure_background,
        sure_foreground,
        markers,
        seeds,
    })
}

/// Segment an image into labelled regions by marker-controlled watershed.
pub fn watershed(image: &DynamicImage, config: &WatershedConfig) -> Result<WatershedOutput, SegmentationError> {
    watershed_with_markers(image, config).map(|(_, output)| output)
}

/// `watershed`, also handing back the seed construction stages.
///
/// `Markers::markers` keeps the labels as they were before flooding.
pub fn watershed_with_markers(
    image: &DynamicImage,
    config: &WatershedConfig,
) -> Result<(Markers, WatershedOutput), SegmentationError> {
    let (gray, rgb) = normalize_channels(image);
    let markers = build_markers(&gray, config)?;

    let mut labels = markers.markers.clone();
    marker_watershed(&rgb, &mut labels)?;

    let mut annotated = rgb;
    paint_boundaries(&mut annotated, &labels, config.boundary_colour);

    let output = WatershedOutput {
        annotated,
        labels,
        seeds: markers.seeds,
    };
    Ok((markers, output))
}

/// Paint every boundary pixel of `labels` onto `image`.
pub fn paint_boundaries(image: &mut RgbImage, labels: &LabelMap, colour: Rgb<u8>) {
    for (x, y, label) in labels.enumerate_pixels() {
        if label[0] == BOUNDARY_LABEL {
            image.put_pixel(x, y, colour);
        }
    }
}

/// Flood `markers` in place from their positive labels.
///
/// Pixels labelled 0 are claimed in order of increasing colour difference to
/// the neighbour that reached them (first come first served at equal
/// difference). A pixel touching two different labels when claimed becomes
/// `BOUNDARY_LABEL`. The one-pixel image frame is always set to the boundary
/// label, and negative input labels are treated as unlabelled.
pub fn marker_watershed(image: &RgbImage, markers: &mut LabelMap) -> Result<(), SegmentationError> {
    if image.dimensions() != markers.dimensions() {
        return Err(SegmentationError::InvalidParameter(format!(
            "marker size {:?} does not match image size {:?}",
            markers.dimensions(),
            image.dimensions()
        )));
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(());
    }
    let (w, h) = (width as usize, height as usize);
    let px = image.as_raw();
    let m: &mut [i32] = markers;

    for x in 0..w {
        m[x] = BOUNDARY_LABEL;
        m[(h - 1) * w + x] = BOUNDARY_LABEL;
    }
    for y in 0..h {
        m[y * w] = BOUNDARY_LABEL;
        m[y * w + w - 1] = BOUNDARY_LABEL;
    }

    let diff = |a: usize, b: usize| -> usize {
        (0..3)
            .map(|c| px[3 * a + c].abs_diff(px[3 * b + c]))
            .max()
            .unwrap_or(0) as usize
    };
    let neighbours = |i: usize| [i - 1, i + 1, i - w, i + w];

    let mut queues: Vec<VecDeque<usize>> = vec![VecDeque::new(); 256];
    for y in 1..h.saturating_sub(1) {
        for x in 1..w - 1 {
            let i = y * w + x;
            if m[i] < 0 {
                m[i] = 0;
            }
            if m[i] != 0 {
                continue;
            }
            let priority = neighbours(i)
                .into_iter()
                .filter(|&n| m[n] > 0)
                .map(|n| diff(i, n))
                .min();
            if let Some(priority) = priority {
                queues[priority].push_back(i);
                m[i] = IN_QUEUE;
            }
        }
    }

    let mut active = 0;
    while active < queues.len() {
        let Some(i) = queues[active].pop_front() else {
            active += 1;
            continue;
        };

        let mut label = 0;
        for n in neighbours(i) {
            let t = m[n];
            if t > 0 {
                if label == 0 {
                    label = t;
                } else if t != label {
                    label = BOUNDARY_LABEL;
                }
            }
        }
        m[i] = label;
        if label == BOUNDARY_LABEL {
            continue;
        }

        for n in neighbours(i) {
            if m[n] == 0 {
                let priority = diff(i, n);
                queues[priority].push_back(n);
                m[n] = IN_QUEUE;
                active = active.min(priority);
            }
        }
    }

    Ok(())
}

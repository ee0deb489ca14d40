use crate::config::{HexFitConfig, WatershedConfig};
use crate::contours::{
    contour_area, cut_out_object, find_contour_corners, find_external_contours, mask_image,
    rotated_bounding_rectangle, sort_contours, MaskColour,
};
use crate::features::{connected_components, extract_largest_component, Connectivity};
use crate::geometry::fit_regular_hexagon;
use crate::models::{Point2D, ThresholdMode};
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};
use crate::segmentation::preprocessing::{adaptive_threshold, opening};
use crate::segmentation::watershed::watershed_with_markers;
use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma};

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .iter()
            .map(|item| item.with_image(DynamicImage::ImageLuma8(item.image.to_luma8())))
            .collect())
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Binarize against the local Gaussian mean
pub struct AdaptiveThresholdStep {
    pub block_size: u32,
    pub constant: i32,
    pub mode: ThresholdMode,
}

impl PipelineStep for AdaptiveThresholdStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let binary = adaptive_threshold(&gray, self.block_size, self.constant, self.mode)?;
            result.push(item.with_image(DynamicImage::ImageLuma8(binary)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }
}

/// Morphological opening with a 3x3 square
pub struct OpeningStep {
    pub iterations: u8,
}

impl PipelineStep for OpeningStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .iter()
            .map(|item| {
                let opened = opening(&item.image.to_luma8(), self.iterations);
                item.with_image(DynamicImage::ImageLuma8(opened))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Opening"
    }
}

/// Marker-based watershed segmentation
///
/// Emits the annotated colour image, or with `emit_regions` the mask of
/// flooded object regions. In debug mode the intermediate masks are saved
/// next to the step output.
pub struct WatershedStep {
    pub config: WatershedConfig,
    pub emit_regions: bool,
}

impl PipelineStep for WatershedStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for (idx, item) in data.into_iter().enumerate() {
            let (markers, output) = watershed_with_markers(&item.image, &self.config)?;

            if let Some(debug) = &context.debug {
                let dir = debug.output_dir.join("watershed_markers");
                std::fs::create_dir_all(&dir)?;
                for (stage, mask) in [
                    ("binary", &markers.binary),
                    ("opened", &markers.opened),
                    ("sure_background", &markers.sure_background),
                    ("sure_foreground", &markers.sure_foreground),
                ] {
                    let path = dir.join(format!("{:02}_{}.png", idx + 1, stage));
                    mask.save(&path)
                        .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
                }
            }

            let image = if self.emit_regions {
                DynamicImage::ImageLuma8(output.region_mask())
            } else {
                DynamicImage::ImageRgb8(output.annotated)
            };
            result.push(
                item.with_image(image)
                    .with_metadata("seeds", MetadataValue::Int(output.seeds as i64)),
            );
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Watershed"
    }
}

/// Keep only the largest connected component; images without one are dropped
pub struct LargestComponentStep;

impl PipelineStep for LargestComponentStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            match extract_largest_component(&item.image.to_luma8()) {
                Ok(mask) => result.push(item.with_image(DynamicImage::ImageLuma8(mask))),
                Err(e) => log::warn!("dropping item: {e}"),
            }
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Largest Component"
    }
}

/// Find external contours in a mask - splits one image into one cut-out per object
///
/// With `mask_neighbours` every other object reaching into the buffered box
/// is blanked, so each cut-out holds a single object.
pub struct ContourCutoutStep {
    pub min_area: f64,
    pub buffer: u32,
    pub blacken_border: bool,
    pub mask_neighbours: bool,
}

impl PipelineStep for ContourCutoutStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = item.image.to_luma8();
            let contours = sort_contours(find_external_contours(&mask));
            let (offset_x, offset_y) = item.bbox.map(|b| (b.x, b.y)).unwrap_or((0, 0));
            let components = self
                .mask_neighbours
                .then(|| connected_components(&mask, Connectivity::Eight));

            for (index, contour) in contours.iter().enumerate() {
                let area = contour_area(contour);
                if area < self.min_area {
                    continue;
                }
                let (crop, local) = match (&components, contour.points.first()) {
                    (Some(components), Some(start)) => {
                        // the traced border belongs to the component under its first point
                        let label = components.labels.get_pixel(start.x as u32, start.y as u32)[0];
                        let object = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
                            Luma([if components.labels.get_pixel(x, y)[0] == label { 255 } else { 0 }])
                        });
                        let isolated = mask_image(&mask, &object, MaskColour::Black)?;
                        cut_out_object(&isolated, contour, self.buffer, self.blacken_border)?
                    }
                    _ => cut_out_object(&mask, contour, self.buffer, self.blacken_border)?,
                };
                let rect = rotated_bounding_rectangle(contour)?;

                let mut bbox = local;
                bbox.x += offset_x;
                bbox.y += offset_y;

                let mut cut = PipelineData::from_region(DynamicImage::ImageLuma8(crop), item.original.clone(), bbox);
                cut.metadata = item.metadata.clone();
                cut.set("contour_index", MetadataValue::Int(index as i64));
                cut.set("area", MetadataValue::Float(area));
                cut.set("rect_cx", MetadataValue::Float(rect.center.x + offset_x as f64));
                cut.set("rect_cy", MetadataValue::Float(rect.center.y + offset_y as f64));
                cut.set("rect_length", MetadataValue::Float(rect.length));
                cut.set("rect_width", MetadataValue::Float(rect.width));
                cut.set("rect_angle", MetadataValue::Float(rect.angle));
                result.push(cut);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Cutout"
    }
}

/// Fit a regular hexagon to the largest object in each cut-out
pub struct HexagonFitStep {
    pub config: HexFitConfig,
}

impl PipelineStep for HexagonFitStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let contours = sort_contours(find_external_contours(&item.image.to_luma8()));
            let Some(contour) = contours.last() else {
                log::debug!("no contour in cut-out, skipping hexagon fit");
                continue;
            };
            let (offset_x, offset_y) = item.bbox.map(|b| (b.x as f64, b.y as f64)).unwrap_or((0.0, 0.0));

            let hex = fit_regular_hexagon(contour, &self.config)?;
            let mut new_item = item.clone();
            new_item.set("hex_cx", MetadataValue::Float(hex.center.x + offset_x));
            new_item.set("hex_cy", MetadataValue::Float(hex.center.y + offset_y));
            new_item.set("hex_radius", MetadataValue::Float(hex.radius));
            new_item.set("hex_rotation", MetadataValue::Float(hex.rotation));
            new_item.set("hex_converged", MetadataValue::Bool(hex.converged));

            match find_contour_corners(contour, 6, true) {
                Ok((corners, _)) => {
                    let points = corners
                        .iter()
                        .map(|&i| Point2D::new(contour.points[i].x + offset_x, contour.points[i].y + offset_y))
                        .collect();
                    new_item.set("corners", MetadataValue::Points(points));
                }
                Err(e) => log::debug!("corner detection failed: {e}"),
            }
            result.push(new_item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Hexagon Fit"
    }
}

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::connected_components as label_regions;
pub use imageproc::region_labelling::Connectivity;

use crate::error::FeatureError;
use crate::models::{ComponentStats, LabelMap, Point2D};

/// Labelling of a binary image plus per-label statistics.
#[derive(Debug, Clone)]
pub struct Components {
    /// 0 for background, `1..=n` for components in raster order of first pixel
    pub labels: LabelMap,
    /// Indexed by label; entry 0 describes the background
    pub stats: Vec<ComponentStats>,
}

impl Components {
    /// Number of labels including the background
    pub fn num_labels(&self) -> usize {
        self.stats.len()
    }

    /// `(label, stats)` for every non-background component
    pub fn foreground(&self) -> impl Iterator<Item = (i32, &ComponentStats)> {
        self.stats.iter().enumerate().skip(1).map(|(i, s)| (i as i32, s))
    }

    /// Label of the component with the largest area, first one on ties.
    pub fn largest(&self) -> Option<i32> {
        self.foreground()
            .fold(None, |best: Option<(i32, u32)>, (label, s)| match best {
                Some((_, area)) if area >= s.area => best,
                _ => Some((label, s.area)),
            })
            .map(|(label, _)| label)
    }
}

#[derive(Clone, Copy)]
struct Accumulator {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u32,
    sum_x: f64,
    sum_y: f64,
}

impl Accumulator {
    fn new(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            count: 0,
            sum_x: 0.0,
            sum_y: 0.0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }

    fn finish(self) -> ComponentStats {
        let n = self.count.max(1) as f64;
        ComponentStats {
            left: self.min_x,
            top: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
            area: self.count,
            centroid: Point2D::new(self.sum_x / n, self.sum_y / n),
        }
    }
}

/// Label the non-zero regions of a binary image and gather their statistics.
pub fn connected_components(binary: &GrayImage, connectivity: Connectivity) -> Components {
    let raw = label_regions(binary, connectivity, Luma([0u8]));
    let (width, height) = raw.dimensions();

    // compact whatever ids the labeller produced into 1..=n by first appearance
    let mut dense: HashMap<u32, i32> = HashMap::new();
    let mut accumulators: Vec<Option<Accumulator>> = vec![None];
    let mut labels = LabelMap::new(width, height);

    for (x, y, pixel) in raw.enumerate_pixels() {
        let label = if pixel[0] == 0 {
            0
        } else {
            let next = accumulators.len() as i32;
            *dense.entry(pixel[0]).or_insert_with(|| {
                accumulators.push(None);
                next
            })
        };
        labels.put_pixel(x, y, Luma([label]));
        accumulators[label as usize]
            .get_or_insert_with(|| Accumulator::new(x, y))
            .add(x, y);
    }

    let stats = accumulators
        .into_iter()
        .map(|acc| {
            acc.map(Accumulator::finish).unwrap_or(ComponentStats {
                left: 0,
                top: 0,
                width: 0,
                height: 0,
                area: 0,
                centroid: Point2D::default(),
            })
        })
        .collect();

    Components { labels, stats }
}

/// Binary mask holding only the largest 4-connected foreground component.
pub fn extract_largest_component(binary: &GrayImage) -> Result<GrayImage, FeatureError> {
    let components = connected_components(binary, Connectivity::Four);
    let largest = components
        .largest()
        .ok_or(FeatureError::NoForegroundComponents)?;
    log::debug!(
        "largest of {} components is label {} ({} px)",
        components.num_labels() - 1,
        largest,
        components.stats[largest as usize].area
    );

    let (width, height) = binary.dimensions();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        if components.labels.get_pixel(x, y)[0] == largest {
            Luma([255])
        } else {
            Luma([0])
        }
    }))
}

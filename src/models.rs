use image::{ImageBuffer, Luma};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Integer label image: 0 is background/unknown, -1 marks watershed boundaries.
pub type LabelMap = ImageBuffer<Luma<i32>, Vec<i32>>;

/// Label written by the watershed flood where two regions meet.
pub const BOUNDARY_LABEL: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point<i32>> for Point2D {
    fn from(p: Point<i32>) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

/// Closed boundary as produced by contour extraction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point2D>,
    /// Index of the enclosing contour in the extraction result, if any
    pub parent: Option<usize>,
    pub is_hole: bool,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self {
            points,
            parent: None,
            is_hole: false,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inclusive pixel extent `(min_x, min_y, max_x, max_y)`
    pub fn pixel_bounds(&self) -> Option<(i64, i64, i64, i64)> {
        let first = self.points.first()?;
        let mut bounds = (
            first.x.floor() as i64,
            first.y.floor() as i64,
            first.x.floor() as i64,
            first.y.floor() as i64,
        );
        for p in &self.points[1..] {
            let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
            bounds.0 = bounds.0.min(x);
            bounds.1 = bounds.1.min(y);
            bounds.2 = bounds.2.max(x);
            bounds.3 = bounds.3.max(y);
        }
        Some(bounds)
    }
}

impl FromIterator<Point2D> for Contour {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Contour::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2D,
    pub radius: f64,
}

impl Circle {
    pub fn contains(&self, p: &Point2D, tolerance: f64) -> bool {
        self.center.distance(p) <= self.radius + tolerance
    }
}

/// Minimum-area rectangle around a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2D,
    /// Longer side, always `>= width`
    pub length: f64,
    pub width: f64,
    /// Side orientation from the x axis, in degrees within `[-90, 0)`.
    ///
    /// The sides are perpendicular, so exactly one side direction falls in
    /// this range. It may belong to either the long or the short side and is
    /// not tied to the order of `corners`.
    pub angle: f64,
    pub corners: [Point2D; 4],
}

/// Regular hexagon fitted to a contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hexagon {
    pub center: Point2D,
    pub radius: f64,
    /// Rotation of vertex 0 from the x axis, in radians
    pub rotation: f64,
    pub vertices: [Point2D; 6],
    pub iterations: usize,
    pub converged: bool,
}

impl Hexagon {
    pub fn from_params(center: Point2D, radius: f64, rotation: f64) -> Self {
        Self {
            center,
            radius,
            rotation,
            vertices: hexagon_vertices(center, radius, rotation),
            iterations: 0,
            converged: true,
        }
    }

    /// Turn an iteration-capped estimate into a hard error.
    pub fn require_converged(self) -> Result<Self, crate::error::FitError> {
        if self.converged {
            Ok(self)
        } else {
            Err(crate::error::FitError::OptimizerNonConvergence {
                iterations: self.iterations,
            })
        }
    }
}

pub fn hexagon_vertices(center: Point2D, radius: f64, rotation: f64) -> [Point2D; 6] {
    std::array::from_fn(|k| {
        let t = rotation + k as f64 * std::f64::consts::FRAC_PI_3;
        Point2D::new(center.x + radius * t.cos(), center.y + radius * t.sin())
    })
}

/// Bounding box in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Per-label statistics of a connected-component labelling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentStats {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub area: u32,
    pub centroid: Point2D,
}

/// How a binarization maps pixels above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Above threshold → 255
    #[default]
    Binary,
    /// Above threshold → 0
    BinaryInverted,
}

impl ThresholdMode {
    pub fn apply(self, above: bool) -> u8 {
        match (self, above) {
            (ThresholdMode::Binary, true) | (ThresholdMode::BinaryInverted, false) => 255,
            _ => 0,
        }
    }
}

/// Named drawing colours.
pub mod colours {
    use image::Rgb;

    pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    pub const LIME: Rgb<u8> = Rgb([0, 255, 0]);
    pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
    pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
    pub const ORANGE: Rgb<u8> = Rgb([255, 128, 0]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);
    pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
    pub const NAVY: Rgb<u8> = Rgb([0, 0, 128]);
    pub const TEAL: Rgb<u8> = Rgb([0, 128, 128]);
    pub const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
    pub const GREEN: Rgb<u8> = Rgb([0, 128, 0]);
    pub const MAROON: Rgb<u8> = Rgb([128, 0, 0]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hexagon_vertices_are_on_circle() {
        let c = Point2D::new(3.0, -2.0);
        for v in hexagon_vertices(c, 5.0, 0.3) {
            assert!((v.distance(&c) - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn threshold_mode_inverts() {
        assert_eq!(ThresholdMode::Binary.apply(true), 255);
        assert_eq!(ThresholdMode::BinaryInverted.apply(true), 0);
        assert_eq!(ThresholdMode::BinaryInverted.apply(false), 255);
    }

    #[test]
    fn pixel_bounds_floor_coordinates() {
        let c = Contour::new(vec![Point2D::new(1.7, 2.2), Point2D::new(4.1, 0.5)]);
        assert_eq!(c.pixel_bounds(), Some((1, 0, 4, 2)));
        assert_eq!(Contour::default().pixel_bounds(), None);
    }
}

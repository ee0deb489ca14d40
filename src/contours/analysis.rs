use std::f64::consts::FRAC_PI_6;

use image::GrayImage;

use crate::error::FitError;
use crate::geometry::{min_area_rect, min_enclosing_circle};
use crate::models::{Contour, Point2D, RotatedRect};

/// Minimum-area rectangle around a contour, with `length >= width`.
pub fn rotated_bounding_rectangle(contour: &Contour) -> Result<RotatedRect, FitError> {
    min_area_rect(&contour.points)
}

/// Corners of a contour tracing a regular `n`-gon.
///
/// Angles around the enclosing-circle centre are split into `n` equal sectors
/// starting at -180°; each sector's corner is its point farthest from the
/// centre. With `aligned` the angles are first rotated by π/6, which puts the
/// sector boundaries between the corners of a hexagon with a corner pointing
/// west. Returns one contour index per sector plus the centre.
pub fn find_contour_corners(
    contour: &Contour,
    n: usize,
    aligned: bool,
) -> Result<(Vec<usize>, Point2D), FitError> {
    if n == 0 {
        return Err(FitError::InvalidParameter("polygon needs at least one side".into()));
    }
    let center = min_enclosing_circle(&contour.points)?.center;
    let (sin, cos) = if aligned { FRAC_PI_6.sin_cos() } else { (0.0, 1.0) };

    let polar: Vec<(f64, f64)> = contour
        .points
        .iter()
        .map(|p| {
            let (dx, dy) = (p.x - center.x, p.y - center.y);
            let (rx, ry) = (dx * cos + dy * sin, -dx * sin + dy * cos);
            (ry.atan2(rx).to_degrees(), rx * rx + ry * ry)
        })
        .collect();

    let step = 360.0 / n as f64;
    let mut corners = Vec::with_capacity(n);
    for sector in 0..n {
        let lo = -180.0 + sector as f64 * step;
        let hi = -180.0 + (sector + 1) as f64 * step;
        let mut best: Option<(usize, f64)> = None;
        for (i, &(theta, r2)) in polar.iter().enumerate() {
            if theta >= lo && theta < hi && best.is_none_or(|(_, b)| r2 > b) {
                best = Some((i, r2));
            }
        }
        match best {
            Some((i, _)) => corners.push(i),
            None => return Err(FitError::EmptySector { sector }),
        }
    }
    Ok((corners, center))
}

/// Enclosed area by the shoelace formula.
pub fn contour_area(contour: &Contour) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let twice: f64 = pts
        .iter()
        .zip(pts.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

/// Sort by ascending enclosed area. Stable, so sorted input is unchanged.
pub fn sort_contours(contours: Vec<Contour>) -> Vec<Contour> {
    let mut keyed: Vec<(f64, Contour)> = contours
        .into_iter()
        .map(|c| (contour_area(&c), c))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, c)| c).collect()
}

/// Intensity-weighted centroid; `None` for an all-zero image.
pub fn center_of_mass(image: &GrayImage) -> Option<Point2D> {
    let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
    for (x, y, p) in image.enumerate_pixels() {
        let v = p[0] as f64;
        m00 += v;
        m10 += x as f64 * v;
        m01 += y as f64 * v;
    }
    (m00 > 0.0).then(|| Point2D::new(m10 / m00, m01 / m00))
}

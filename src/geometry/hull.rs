use crate::error::FitError;
use crate::models::{Point2D, RotatedRect};

fn cross(o: Point2D, a: Point2D, b: Point2D) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by Andrew's monotone chain, collinear points dropped.
pub fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    let mut pts: Vec<Point2D> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2D> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Minimum-area enclosing rectangle, trying each hull edge as a side.
///
/// `length >= width` holds for every result.
pub fn min_area_rect(points: &[Point2D]) -> Result<RotatedRect, FitError> {
    let hull = convex_hull(points);
    let (axis, extents) = match hull.len() {
        0 => return Err(FitError::EmptyInput),
        1 => ((1.0, 0.0), project(&hull, (1.0, 0.0))),
        2 => {
            let axis = unit(hull[0], hull[1]);
            (axis, project(&hull, axis))
        }
        n => (0..n)
            .map(|i| {
                let axis = unit(hull[i], hull[(i + 1) % n]);
                (axis, project(&hull, axis))
            })
            .min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
            .ok_or(FitError::EmptyInput)?,
    };

    let (ux, uy) = axis;
    let (vx, vy) = (-uy, ux);
    let mid_u = (extents.min_u + extents.max_u) / 2.0;
    let mid_v = (extents.min_v + extents.max_v) / 2.0;
    let center = Point2D::new(ux * mid_u + vx * mid_v, uy * mid_u + vy * mid_v);
    let half_u = (extents.max_u - extents.min_u) / 2.0;
    let half_v = (extents.max_v - extents.min_v) / 2.0;

    let corner = |su: f64, sv: f64| {
        Point2D::new(
            center.x + su * half_u * ux + sv * half_v * vx,
            center.y + su * half_u * uy + sv * half_v * vy,
        )
    };
    let corners = [
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
        corner(-1.0, 1.0),
    ];

    let mut angle = uy.atan2(ux).to_degrees().rem_euclid(90.0) - 90.0;
    if angle >= 0.0 {
        angle -= 90.0;
    }

    let (side_u, side_v) = (2.0 * half_u, 2.0 * half_v);
    Ok(RotatedRect {
        center,
        length: side_u.max(side_v),
        width: side_u.min(side_v),
        angle,
        corners,
    })
}

struct Extents {
    min_u: f64,
    max_u: f64,
    min_v: f64,
    max_v: f64,
}

impl Extents {
    fn area(&self) -> f64 {
        (self.max_u - self.min_u) * (self.max_v - self.min_v)
    }
}

fn unit(a: Point2D, b: Point2D) -> (f64, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    if len == 0.0 { (1.0, 0.0) } else { (dx / len, dy / len) }
}

fn project(points: &[Point2D], (ux, uy): (f64, f64)) -> Extents {
    let mut e = Extents {
        min_u: f64::INFINITY,
        max_u: f64::NEG_INFINITY,
        min_v: f64::INFINITY,
        max_v: f64::NEG_INFINITY,
    };
    for p in points {
        let u = p.x * ux + p.y * uy;
        let v = -p.x * uy + p.y * ux;
        e.min_u = e.min_u.min(u);
        e.max_u = e.max_u.max(u);
        e.min_v = e.min_v.min(v);
        e.max_v = e.max_v.max(v);
    }
    e
}

use nalgebra::Matrix3;

use crate::error::FitError;
use crate::models::{Circle, Point2D};

use super::hull::convex_hull;

/// Relative size below which the triangle determinant counts as zero.
const DEGENERATE_EPS: f64 = 1e-12;

/// Circle through three points, from the determinant form of
/// `A(x² + y²) + Bx + Cy + D = 0`.
///
/// Collinear or repeated points give `FitError::DegenerateGeometry`.
pub fn fit_circle_three_points(p1: Point2D, p2: Point2D, p3: Point2D) -> Result<Circle, FitError> {
    let s = |p: Point2D| p.x * p.x + p.y * p.y;

    let a = Matrix3::new(
        p1.x, p1.y, 1.0,
        p2.x, p2.y, 1.0,
        p3.x, p3.y, 1.0,
    )
    .determinant();

    let spread = p1
        .distance_squared(&p2)
        .max(p2.distance_squared(&p3))
        .max(p1.distance_squared(&p3));
    if !a.is_finite() || spread == 0.0 || a.abs() <= DEGENERATE_EPS * spread {
        return Err(FitError::DegenerateGeometry);
    }

    let b = -Matrix3::new(
        s(p1), p1.y, 1.0,
        s(p2), p2.y, 1.0,
        s(p3), p3.y, 1.0,
    )
    .determinant();
    let c = Matrix3::new(
        s(p1), p1.x, 1.0,
        s(p2), p2.x, 1.0,
        s(p3), p3.x, 1.0,
    )
    .determinant();
    let d = -Matrix3::new(
        s(p1), p1.x, p1.y,
        s(p2), p2.x, p2.y,
        s(p3), p3.x, p3.y,
    )
    .determinant();

    let center = Point2D::new(-b / (2.0 * a), -c / (2.0 * a));
    // rounding can push a tiny radicand below zero
    let radius = ((b * b + c * c - 4.0 * a * d) / (4.0 * a * a)).max(0.0).sqrt();

    if !(center.x.is_finite() && center.y.is_finite() && radius.is_finite()) {
        return Err(FitError::DegenerateGeometry);
    }
    Ok(Circle { center, radius })
}

fn circle_from_diameter(a: Point2D, b: Point2D) -> Circle {
    Circle {
        center: Point2D::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
        radius: a.distance(&b) / 2.0,
    }
}

fn circle_from_three(a: Point2D, b: Point2D, c: Point2D) -> Circle {
    fit_circle_three_points(a, b, c).unwrap_or_else(|_| {
        // collinear: the farthest pair spans the circle
        [(a, b), (b, c), (a, c)]
            .into_iter()
            .map(|(p, q)| circle_from_diameter(p, q))
            .max_by(|x, y| x.radius.total_cmp(&y.radius))
            .unwrap_or(Circle { center: a, radius: 0.0 })
    })
}

/// Smallest circle containing every point.
///
/// Runs the incremental Welzl construction over the convex hull, which has the
/// same enclosing circle as the full set.
pub fn min_enclosing_circle(points: &[Point2D]) -> Result<Circle, FitError> {
    let hull = convex_hull(points);
    let Some(&first) = hull.first() else {
        return Err(FitError::EmptyInput);
    };

    let scale = hull
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(1.0, f64::max);
    let tol = 1e-9 * scale;

    let mut circle = Circle { center: first, radius: 0.0 };
    for i in 1..hull.len() {
        if circle.contains(&hull[i], tol) {
            continue;
        }
        circle = Circle { center: hull[i], radius: 0.0 };
        for j in 0..i {
            if circle.contains(&hull[j], tol) {
                continue;
            }
            circle = circle_from_diameter(hull[i], hull[j]);
            for k in 0..j {
                if !circle.contains(&hull[k], tol) {
                    circle = circle_from_three(hull[i], hull[j], hull[k]);
                }
            }
        }
    }
    Ok(circle)
}

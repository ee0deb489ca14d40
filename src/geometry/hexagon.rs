use std::f64::consts::FRAC_PI_3;

use crate::config::HexFitConfig;
use crate::error::FitError;
use crate::models::{hexagon_vertices, Contour, Hexagon, Point2D};

use super::circle::min_enclosing_circle;

/// Fit a regular hexagon to contour points.
///
/// Seeds `(cx, cy, r, θ = 0)` from the minimal enclosing circle and minimizes
/// the summed distance from each point to its nearest hexagon edge with
/// Nelder-Mead. The result is the optimizer's terminal estimate; hitting the
/// iteration cap is reported through `Hexagon::converged`, not as an error.
pub fn fit_regular_hexagon(contour: &Contour, config: &HexFitConfig) -> Result<Hexagon, FitError> {
    let seed = min_enclosing_circle(&contour.points)?;
    let points = &contour.points;

    let objective = |p: &[f64; 4]| hexagon_distance(points, Point2D::new(p[0], p[1]), p[2], p[3]);

    let scale = if seed.radius > 0.0 { seed.radius } else { 1.0 };
    let result = nelder_mead(
        objective,
        [seed.center.x, seed.center.y, seed.radius, 0.0],
        [0.1 * scale, 0.1 * scale, 0.1 * scale, 0.1],
        config.max_iterations,
        config.tolerance,
    );

    let [cx, cy, mut radius, mut rotation] = result.x;
    if radius < 0.0 {
        radius = -radius;
        rotation += std::f64::consts::PI;
    }
    rotation = rotation.rem_euclid(FRAC_PI_3);

    if !result.converged {
        log::warn!(
            "hexagon fit hit the iteration cap ({}), returning best estimate (cost {:.3})",
            result.iterations,
            result.value
        );
    } else {
        log::debug!(
            "hexagon fit converged after {} iterations (cost {:.3})",
            result.iterations,
            result.value
        );
    }

    let center = Point2D::new(cx, cy);
    Ok(Hexagon {
        center,
        radius,
        rotation,
        vertices: hexagon_vertices(center, radius, rotation),
        iterations: result.iterations,
        converged: result.converged,
    })
}

/// Sum over points of the distance to the closest hexagon edge.
pub fn hexagon_distance(points: &[Point2D], center: Point2D, radius: f64, rotation: f64) -> f64 {
    let vertices = hexagon_vertices(center, radius, rotation);
    points
        .iter()
        .map(|p| {
            (0..6)
                .map(|k| segment_distance(*p, vertices[(k + 5) % 6], vertices[k]))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point2D::new(a.x + t * dx, a.y + t * dy))
}

pub(crate) struct NelderMeadResult<const N: usize> {
    pub x: [f64; N],
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Downhill simplex with standard coefficients (reflect 1, expand 2,
/// contract 0.5, shrink 0.5).
///
/// Stops when both the objective spread and the simplex extent fall below
/// `tolerance`, or after `max_iterations`.
pub(crate) fn nelder_mead<const N: usize>(
    f: impl Fn(&[f64; N]) -> f64,
    start: [f64; N],
    steps: [f64; N],
    max_iterations: usize,
    tolerance: f64,
) -> NelderMeadResult<N> {
    let eval = |x: &[f64; N]| {
        let v = f(x);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    let mut simplex: Vec<([f64; N], f64)> = Vec::with_capacity(N + 1);
    simplex.push((start, eval(&start)));
    for i in 0..N {
        let mut x = start;
        x[i] += steps[i];
        simplex.push((x, eval(&x)));
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (best, best_val) = simplex[0];
        let spread = simplex[N].1 - best_val;
        let extent = simplex[1..]
            .iter()
            .flat_map(|(x, _)| x.iter().zip(best.iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if spread <= tolerance && extent <= tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        let mut centroid = [0.0; N];
        for (x, _) in &simplex[..N] {
            for i in 0..N {
                centroid[i] += x[i] / N as f64;
            }
        }
        let worst = simplex[N].0;
        let towards = |coef: f64| -> [f64; N] {
            std::array::from_fn(|i| centroid[i] + coef * (worst[i] - centroid[i]))
        };

        let reflected = towards(-1.0);
        let reflected_val = eval(&reflected);
        if reflected_val < best_val {
            let expanded = towards(-2.0);
            let expanded_val = eval(&expanded);
            simplex[N] = if expanded_val < reflected_val {
                (expanded, expanded_val)
            } else {
                (reflected, reflected_val)
            };
            continue;
        }
        if reflected_val < simplex[N - 1].1 {
            simplex[N] = (reflected, reflected_val);
            continue;
        }

        let (contracted, contracted_val) = if reflected_val < simplex[N].1 {
            let x = towards(-0.5);
            (x, eval(&x))
        } else {
            let x = towards(0.5);
            (x, eval(&x))
        };
        if contracted_val < simplex[N].1.min(reflected_val) {
            simplex[N] = (contracted, contracted_val);
            continue;
        }

        for (x, val) in simplex.iter_mut().skip(1) {
            *x = std::array::from_fn(|i| best[i] + 0.5 * (x[i] - best[i]));
            *val = eval(x);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex[0];
    NelderMeadResult {
        x,
        value,
        iterations,
        converged,
    }
}

//! Closed-form and iterative shape fitting over point sets.

pub mod circle;
pub mod hexagon;
pub mod hull;

pub use circle::{fit_circle_three_points, min_enclosing_circle};
pub use hexagon::{fit_regular_hexagon, hexagon_distance, segment_distance};
pub use hull::{convex_hull, min_area_rect};

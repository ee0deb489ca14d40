pub mod preprocessing;
pub mod steps;
pub mod watershed;

pub use watershed::{build_markers, marker_watershed, watershed, watershed_with_markers, Markers, WatershedOutput};

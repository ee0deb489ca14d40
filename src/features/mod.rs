pub mod components;
pub mod peaks;

pub use components::{connected_components, extract_largest_component, Components, Connectivity};
pub use peaks::{find_colour, histogram_peak, lab_b_channel, TargetColour};

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from imtools for tests
pub use imtools::{Contour, HexFitConfig, Pipeline, Point2D, WatershedConfig};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

use thiserror::Error;

/// Failures of the geometric fitting and contour routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("points are collinear or coincident")]
    DegenerateGeometry,

    #[error("no points to fit")]
    EmptyInput,

    #[error("no contour points in corner sector {sector}")]
    EmptySector { sector: usize },

    #[error("optimizer stopped after {iterations} iterations without converging")]
    OptimizerNonConvergence { iterations: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("contour lies outside the image")]
    OutOfBounds,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("image has no foreground components")]
    NoForegroundComponents,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

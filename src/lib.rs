pub mod config;
pub mod contours;
pub mod error;
pub mod features;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod segmentation;

pub use config::{ColourConfig, HexFitConfig, PeakConfig, ToolConfig, WatershedConfig};
pub use error::{FeatureError, FitError, SegmentationError};
pub use models::{
    BoundingBox, Circle, ComponentStats, Contour, Hexagon, LabelMap, Point2D, RotatedRect,
    ThresholdMode,
};
pub use pipeline::{DebugConfig, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};

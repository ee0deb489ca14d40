use std::path::Path;

use anyhow::{Context, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::models::{colours, ThresholdMode};

/// Parameters of the marker-based watershed segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatershedConfig {
    /// Distance (px) from the nearest background pixel above which a pixel
    /// is treated as a sure seed
    pub watershed_threshold: f64,
    /// Adaptive threshold window, odd and at least 3
    pub block_size: u32,
    /// Subtracted from the local Gaussian mean
    pub constant: i32,
    pub mode: ThresholdMode,
    pub opening_iterations: u8,
    pub background_dilation: u8,
    #[serde(with = "rgb_serde")]
    pub boundary_colour: Rgb<u8>,
}

impl Default for WatershedConfig {
    fn default() -> Self {
        Self {
            watershed_threshold: 1.0,
            block_size: 3,
            constant: 0,
            mode: ThresholdMode::Binary,
            opening_iterations: 2,
            background_dilation: 3,
            boundary_colour: colours::RED,
        }
    }
}

/// Nelder-Mead settings for the hexagon fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexFitConfig {
    pub max_iterations: usize,
    /// Stop once both the simplex objective spread and its extent fall below this value
    pub tolerance: f64,
}

impl Default for HexFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-6,
        }
    }
}

/// Intensity range searched by `histogram_peak`, upper bound exclusive.
///
/// The lower bound of 20 skips the near-black background bins that dominate
/// typical scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    pub lower: u16,
    pub upper: u16,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            lower: 20,
            upper: 255,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColourConfig {
    /// Offset below the b* histogram peak used as the colour threshold
    pub offset: u8,
    pub peak: PeakConfig,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            offset: 8,
            peak: PeakConfig::default(),
        }
    }
}

/// Everything the command line tools can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub watershed: WatershedConfig,
    pub hex_fit: HexFitConfig,
    pub peak: PeakConfig,
    pub colour: ColourConfig,
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

mod rgb_serde {
    use image::Rgb;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(colour: &Rgb<u8>, s: S) -> Result<S::Ok, S::Error> {
        colour.0.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb<u8>, D::Error> {
        <[u8; 3]>::deserialize(d).map(Rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ToolConfig = serde_json::from_str(
            r#"{ "watershed": { "block_size": 51, "mode": "binary_inverted" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.watershed.block_size, 51);
        assert_eq!(cfg.watershed.mode, ThresholdMode::BinaryInverted);
        assert_eq!(cfg.watershed.opening_iterations, 2);
        assert_eq!(cfg.peak, PeakConfig { lower: 20, upper: 255 });
        assert_eq!(cfg.colour.offset, 8);
    }

    #[test]
    fn boundary_colour_is_an_array() {
        let json = serde_json::to_string(&WatershedConfig::default()).unwrap();
        assert!(json.contains("\"boundary_colour\":[255,0,0]"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "hex_fit": { "max_iterations": 10 } }"#).unwrap();
        let cfg = ToolConfig::load(&path).unwrap();
        assert_eq!(cfg.hex_fit.max_iterations, 10);
        assert!(ToolConfig::load(&dir.path().join("missing.json")).is_err());
    }
}

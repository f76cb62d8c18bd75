use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame::ColorModel;

use super::domain::stage_error::StageError;

/// Largest 8-bit hue value plus one (hue is stored as degrees / 2).
pub const HUE_RANGE: u8 = 180;

/// Largest accepted Gaussian kernel width.
pub const MAX_BLUR_KERNEL_SIZE: usize = 255;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] StageError),
}

/// Color model the threshold stage works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetModel {
    Hls,
    Hsv,
}

impl TargetModel {
    pub fn color_model(self) -> ColorModel {
        match self {
            TargetModel::Hls => ColorModel::Hls,
            TargetModel::Hsv => ColorModel::Hsv,
        }
    }
}

impl fmt::Display for TargetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.color_model(), f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurParams {
    /// Odd kernel side length; 1 disables the blur.
    pub kernel_size: usize,
    /// Standard deviation in pixels; zero or negative derives it from the
    /// kernel size.
    pub sigma: f64,
}

/// Closed per-channel interval, in the channel order of the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenoiseParams {
    /// Odd side length of the square structuring element.
    pub kernel_size: u8,
    pub erode_iterations: u8,
    pub dilate_iterations: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Maximum distance, in pixels, between a contour and its approximating
    /// polygon.
    pub approx_epsilon: f64,
}

/// Stage parameters for one run of the tracking pipeline.
///
/// The two presets mirror the two tunings the tracker ships with: a
/// lightness-keyed HLS filter behind a 15px blur, and a value-keyed HSV
/// filter behind a heavier 25px blur. Missing fields in a JSON file fall
/// back to the HLS preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub blur: BlurParams,
    pub color_model: TargetModel,
    pub threshold: ThresholdBounds,
    pub invert_mask: bool,
    pub denoise: DenoiseParams,
    pub shape: ShapeParams,
}

impl PipelineConfig {
    pub fn hls() -> Self {
        Self {
            blur: BlurParams {
                kernel_size: 15,
                sigma: 20.0,
            },
            color_model: TargetModel::Hls,
            threshold: ThresholdBounds {
                low: [0, 225, 0],
                high: [25, 255, 40],
            },
            invert_mask: false,
            denoise: DenoiseParams {
                kernel_size: 3,
                erode_iterations: 2,
                dilate_iterations: 2,
            },
            shape: ShapeParams {
                approx_epsilon: 13.0,
            },
        }
    }

    pub fn hsv() -> Self {
        Self {
            blur: BlurParams {
                kernel_size: 25,
                sigma: 50.0,
            },
            color_model: TargetModel::Hsv,
            threshold: ThresholdBounds {
                low: [0, 0, 225],
                high: [75, 50, 255],
            },
            ..Self::hls()
        }
    }

    /// Looks up a preset by name (`"hls"` or `"hsv"`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "hls" => Some(Self::hls()),
            "hsv" => Some(Self::hsv()),
            _ => None,
        }
    }

    /// Loads a JSON file on top of the HLS preset.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Self::default().overlay_json_file(path)
    }

    /// Applies a JSON file on top of `self`. Nested objects merge field by
    /// field, so `{ "blur": { "sigma": 3.0 } }` only changes the sigma.
    pub fn overlay_json_file(&self, path: &Path) -> Result<Self, ConfigError> {
        let parse_err = |source: serde_json::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: serde_json::Value = serde_json::from_str(&json).map_err(parse_err)?;
        let mut merged = serde_json::to_value(self).map_err(parse_err)?;
        merge_json(&mut merged, overlay);

        let config: Self = serde_json::from_value(merged).map_err(parse_err)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), StageError> {
        check_blur_kernel_size(self.blur.kernel_size)?;
        if !self.blur.sigma.is_finite() {
            return Err(StageError::InvalidParameter(format!(
                "blur sigma must be finite, got {}",
                self.blur.sigma
            )));
        }

        let ThresholdBounds { low, high } = self.threshold;
        if let Some(c) = (0..3).find(|&c| low[c] > high[c]) {
            return Err(StageError::InvalidParameter(format!(
                "threshold channel {c}: low bound {} exceeds high bound {}",
                low[c], high[c]
            )));
        }
        if low[0] >= HUE_RANGE {
            return Err(StageError::InvalidParameter(format!(
                "threshold low hue bound {} can never match (hue < {HUE_RANGE})",
                low[0]
            )));
        }

        if self.denoise.kernel_size == 0 || self.denoise.kernel_size % 2 == 0 {
            return Err(StageError::InvalidParameter(format!(
                "denoise kernel size must be a positive odd integer, got {}",
                self.denoise.kernel_size
            )));
        }

        if !(self.shape.approx_epsilon.is_finite() && self.shape.approx_epsilon > 0.0) {
            return Err(StageError::InvalidParameter(format!(
                "polygon approximation epsilon must be positive, got {}",
                self.shape.approx_epsilon
            )));
        }
        Ok(())
    }
}

fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::hls()
    }
}

pub(crate) fn check_blur_kernel_size(size: usize) -> Result<(), StageError> {
    if size == 0 || size % 2 == 0 || size > MAX_BLUR_KERNEL_SIZE {
        return Err(StageError::InvalidParameter(format!(
            "blur kernel size must be an odd integer in 1..={MAX_BLUR_KERNEL_SIZE}, got {size}"
        )));
    }
    Ok(())
}

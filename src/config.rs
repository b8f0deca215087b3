//! Evaluation configuration.
//!
//! Every tunable of the pipeline lives in [`EvalConfig`], which is passed
//! explicitly to the components that need it. A TOML file may override any
//! subset of the defaults:
//!
//! ```toml
//! [sweep]
//! start = 0.1
//! end = 0.9
//! steps = 20
//! parallel = false
//!
//! [matching]
//! strategy = "greedy-first"   # or "best-iou"
//! spatial_index = false
//!
//! [annotations]
//! circle_scale = 0.08
//! radius_in_world_units = false
//!
//! [reprojection]
//! target_crs = "EPSG:32718"
//! align_predictions = true
//!
//! [plot]
//! series_label = "Ceroxylon"
//! file_name = "PR_curve.svg"
//! ```

use crate::crs::Crs;
use crate::error::{GeoEvalError, Result};
use crate::matching::MatchConfig;
use crate::threshold::{generate_threshold_range, DEFAULT_END, DEFAULT_START, DEFAULT_STEPS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scale applied to the measured radius of circular annotations.
pub const DEFAULT_CIRCLE_SCALE: f64 = 0.08;
/// CRS detections are reprojected into before persistence (WGS 84 / UTM 18S).
pub const DEFAULT_TARGET_EPSG: u32 = 32718;
/// Legend entry of the plotted series.
pub const DEFAULT_SERIES_LABEL: &str = "Ceroxylon";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    pub sweep: SweepConfig,
    pub matching: MatchConfig,
    pub annotations: AnnotationConfig,
    pub reprojection: ReprojectionConfig,
    pub plot: PlotConfig,
}

/// IoU threshold sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
    /// Evaluate thresholds on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
            steps: DEFAULT_STEPS,
            parallel: false,
        }
    }
}

impl SweepConfig {
    /// The thresholds this sweep visits, ascending.
    pub fn thresholds(&self) -> Result<Vec<f64>> {
        generate_threshold_range(self.start, self.end, self.steps)
    }
}

/// Conversion of point annotations into ground-truth squares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationConfig {
    /// Half-side of the square is `radius * circle_scale`.
    pub circle_scale: f64,
    /// Measure the radius between the georeferenced points instead of in pixels.
    pub radius_in_world_units: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            circle_scale: DEFAULT_CIRCLE_SCALE,
            radius_in_world_units: false,
        }
    }
}

/// CRS handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReprojectionConfig {
    /// CRS georeferenced detections are written in.
    pub target_crs: Crs,
    /// Reproject predictions into the ground-truth CRS when they differ;
    /// otherwise a mismatch is an error.
    pub align_predictions: bool,
}

impl Default for ReprojectionConfig {
    fn default() -> Self {
        Self {
            target_crs: Crs::from_epsg(DEFAULT_TARGET_EPSG),
            align_predictions: true,
        }
    }
}

/// Precision-recall plot appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub series_label: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// File name inside the output directory; `.svg` selects vector output.
    pub file_name: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            series_label: DEFAULT_SERIES_LABEL.to_string(),
            title: "Precision-Recall Curve".to_string(),
            width: 1500,
            height: 900,
            file_name: "PR_curve.svg".to_string(),
        }
    }
}

impl EvalConfig {
    /// Load and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| GeoEvalError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate TOML configuration text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EvalConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.sweep.thresholds()?;

        let scale = self.annotations.circle_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeoEvalError::Config(format!(
                "annotations.circle_scale must be a positive number, got {}",
                scale
            )));
        }

        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(GeoEvalError::Config(format!(
                "plot size must be non-zero, got {}x{}",
                self.plot.width, self.plot.height
            )));
        }
        if self.plot.file_name.trim().is_empty() {
            return Err(GeoEvalError::Config("plot.file_name must not be empty".to_string()));
        }
        Ok(())
    }
}

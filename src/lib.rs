//! # geo-eval
//!
//! A Rust library for evaluating object detections on georeferenced rasters.
//!
//! Model outputs arrive as pixel-space boxes. They are mapped into world
//! coordinates with the raster's affine transform, reprojected into a target
//! CRS and compared with annotated ground truth using Intersection over
//! Union (IoU). The result is a precision-recall curve over a sweep of IoU
//! thresholds.
//!
//! ## Features
//!
//! - Affine pixel-to-world transforms, including ESRI world files
//! - Bounding polygons from box corners or from circular point annotations
//! - Reprojection between WGS 84, Web Mercator and UTM zones
//! - Greedy IoU matching with an optional R-tree candidate index
//! - Precision-recall sweeps, sequential or on the rayon pool
//! - GeoJSON, raw detection JSON and LabelMe input; GeoJSON and plot output
//!
//! ## Quick Start
//!
//! ```rust
//! use geo_eval::config::EvalConfig;
//! use geo_eval::evaluator::evaluate_files;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EvalConfig::default();
//!
//! // let curve = evaluate_files("ground_truth.geojson", "predictions.geojson", &config)?;
//! // for point in &curve.points {
//! //     println!("{:.2}: P={:.3} R={:.3}", point.iou_threshold, point.precision, point.recall);
//! // }
//! # let _ = config;
//! # Ok(())
//! # }
//! ```
//!
//! ## Raw detection format
//!
//! ```json
//! [
//!   { "class_id": 0, "confidence": 0.91, "bbox": [x1, y1, x2, y2] }
//! ]
//! ```
//!
//! `(x1, y1)` is the top-left and `(x2, y2)` the bottom-right pixel corner.

pub mod annotation;
pub mod config;
pub mod crs;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod geometry;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod plot;
pub mod stats;
pub mod threshold;
pub mod transform;
pub mod types;

// Re-export commonly used types and functions
pub use config::EvalConfig;
pub use crs::{Crs, Reprojector};
pub use error::{GeoEvalError, Result};
pub use evaluator::{evaluate_collections, evaluate_files, generate_pr_curve, georeference_detections};
pub use matching::{match_detections, MatchConfig, MatchOutcome, MatchStrategy};
pub use threshold::{default_iou_thresholds, generate_threshold_range};
pub use transform::{GeoTransform, RasterGeoreference};
pub use types::{
    Detection, GeometryCollection, GroundTruthRecord, Label, PrCurve, RawDetection, SpatialRecord,
    ThresholdPoint,
};

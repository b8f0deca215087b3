//! Precision-recall evaluation over a sweep of IoU thresholds.

use crate::config::{EvalConfig, PlotConfig, SweepConfig};
use crate::crs::{Crs, Reprojector};
use crate::error::{GeoEvalError, Result};
use crate::loader::{load_detections, load_ground_truth};
use crate::matching::{match_detections, MatchConfig};
use crate::plot::render_pr_curve;
use crate::transform::RasterGeoreference;
use crate::types::{
    Detection, GeometryCollection, PrCurve, RawDetection, SpatialRecord, ThresholdFailure, ThresholdPoint,
};
use log::{error, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the serialized curve inside the output directory.
pub const CURVE_FILE_NAME: &str = "pr_curve.json";

/// Files produced by [`write_curve_outputs`].
#[derive(Debug, Clone, PartialEq)]
pub struct CurveOutputs {
    pub metrics: PathBuf,
    /// `None` when the plot could not be rendered.
    pub plot: Option<PathBuf>,
}

/// Evaluate one threshold with fresh matched state.
pub fn evaluate_threshold<P: SpatialRecord, G: SpatialRecord>(
    predictions: &[P],
    ground_truth: &[G],
    iou_threshold: f64,
    matching: &MatchConfig,
) -> Result<ThresholdPoint> {
    let outcome = match_detections(predictions, ground_truth, iou_threshold, matching)?;
    Ok(outcome.to_threshold_point(iou_threshold))
}

/// Compute the precision-recall curve over `thresholds`.
///
/// Every threshold is matched independently, so the result does not depend
/// on the order thresholds are visited in. Points are returned in ascending
/// threshold order. A threshold that fails to evaluate is logged, recorded in
/// [`PrCurve::failures`] and left out of the curve.
///
/// # Example
///
/// ```
/// use geo::coord;
/// use geo_eval::config::SweepConfig;
/// use geo_eval::evaluator::generate_pr_curve;
/// use geo_eval::geometry::rectangle_from_corners;
/// use geo_eval::matching::MatchConfig;
///
/// let gt = vec![rectangle_from_corners(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 })];
/// let pred = gt.clone();
/// let curve = generate_pr_curve(&pred, &gt, &[0.5, 0.9], &SweepConfig::default(), &MatchConfig::default());
/// assert_eq!(curve.points.len(), 2);
/// assert_eq!(curve.points[1].recall, 1.0);
/// ```
pub fn generate_pr_curve<P, G>(
    predictions: &[P],
    ground_truth: &[G],
    thresholds: &[f64],
    sweep: &SweepConfig,
    matching: &MatchConfig,
) -> PrCurve
where
    P: SpatialRecord + Sync,
    G: SpatialRecord + Sync,
{
    let results: Vec<(f64, Result<ThresholdPoint>)> = if sweep.parallel {
        thresholds
            .par_iter()
            .map(|&t| (t, evaluate_threshold(predictions, ground_truth, t, matching)))
            .collect()
    } else {
        thresholds
            .iter()
            .map(|&t| (t, evaluate_threshold(predictions, ground_truth, t, matching)))
            .collect()
    };

    let mut curve = PrCurve::default();
    for (iou_threshold, result) in results {
        match result {
            Ok(point) => curve.points.push(point),
            Err(e) => {
                error!("Threshold {} failed: {}", iou_threshold, e);
                curve.failures.push(ThresholdFailure {
                    iou_threshold,
                    message: e.to_string(),
                });
            }
        }
    }

    curve.points.sort_by(|a, b| a.iou_threshold.total_cmp(&b.iou_threshold));
    for point in &curve.points {
        info!(
            "Threshold: {:.2}, Precision: {:.3}, Recall: {:.3}",
            point.iou_threshold, point.precision, point.recall
        );
    }

    curve
}

/// Bring both collections into one CRS and sweep the configured thresholds.
///
/// When both collections declare different CRSs the predictions are
/// reprojected into the ground-truth CRS, unless
/// `reprojection.align_predictions` is off, in which case the mismatch is an
/// error.
pub fn evaluate_collections<P, G>(
    predictions: GeometryCollection<P>,
    ground_truth: &GeometryCollection<G>,
    config: &EvalConfig,
) -> Result<PrCurve>
where
    P: SpatialRecord + Sync,
    G: SpatialRecord + Sync,
{
    let thresholds = config.sweep.thresholds()?;
    let predictions = align_crs(predictions, ground_truth.crs, config.reprojection.align_predictions)?;

    info!(
        "Evaluating {} predictions against {} ground-truth records over {} thresholds",
        predictions.len(),
        ground_truth.len(),
        thresholds.len()
    );

    Ok(generate_pr_curve(
        &predictions.records,
        &ground_truth.records,
        &thresholds,
        &config.sweep,
        &config.matching,
    ))
}

/// Load ground truth and predictions from GeoJSON files and evaluate them.
///
/// # Errors
///
/// Returns `Input` naming the path when either file cannot be opened.
pub fn evaluate_files<P: AsRef<Path>, Q: AsRef<Path>>(
    ground_truth_path: P,
    predictions_path: Q,
    config: &EvalConfig,
) -> Result<PrCurve> {
    let ground_truth = load_ground_truth(ground_truth_path)?;
    let predictions = load_detections(predictions_path)?;
    evaluate_collections(predictions, &ground_truth, config)
}

/// Write `curve` as JSON into `output_dir`, then render its plot there.
///
/// The JSON is written first. A render failure is logged and leaves
/// `plot` empty; it never discards the metrics.
///
/// # Errors
///
/// Returns `IoError` when the directory or the JSON file cannot be written.
pub fn write_curve_outputs(curve: &PrCurve, output_dir: &Path, config: &PlotConfig) -> Result<CurveOutputs> {
    fs::create_dir_all(output_dir)?;

    let metrics = output_dir.join(CURVE_FILE_NAME);
    fs::write(&metrics, serde_json::to_string_pretty(curve)?)?;
    info!("Curve written to {}", metrics.display());

    let plot_path = output_dir.join(&config.file_name);
    let plot = match render_pr_curve(curve, &plot_path, config) {
        Ok(()) => {
            info!("Plot written to {}", plot_path.display());
            Some(plot_path)
        }
        Err(e) => {
            error!("Failed to render {}: {}", plot_path.display(), e);
            None
        }
    };

    Ok(CurveOutputs { metrics, plot })
}

/// Georeference raw pixel boxes and reproject them into `target_crs`.
pub fn georeference_detections(
    raw: &[RawDetection],
    georef: &RasterGeoreference,
    target_crs: Crs,
) -> Result<GeometryCollection<Detection>> {
    let detections = raw.iter().map(|d| d.georeference(&georef.transform)).collect();
    let collection = GeometryCollection::new(Some(georef.crs), detections);
    Reprojector::new(georef.crs, target_crs)?.collection(collection)
}

fn align_crs<P: SpatialRecord>(
    predictions: GeometryCollection<P>,
    target: Option<Crs>,
    align: bool,
) -> Result<GeometryCollection<P>> {
    match (predictions.crs, target) {
        (Some(found), Some(expected)) if found != expected => {
            if !align {
                return Err(GeoEvalError::CrsMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
            warn!("Reprojecting predictions from {} to {}", found, expected);
            Reprojector::new(found, expected)?.collection(predictions)
        }
        (None, Some(expected)) => {
            warn!("Predictions declare no CRS; assuming {}", expected);
            Ok(predictions)
        }
        (Some(found), None) => {
            warn!("Ground truth declares no CRS; assuming {}", found);
            Ok(predictions)
        }
        _ => Ok(predictions),
    }
}

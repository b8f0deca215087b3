//! Stress tests with large collections and dense scenes.

use geo::{coord, Polygon};
use geo_eval::config::{EvalConfig, SweepConfig};
use geo_eval::crs::Crs;
use geo_eval::evaluator::{evaluate_collections, generate_pr_curve, georeference_detections};
use geo_eval::geometry::rectangle_from_corners;
use geo_eval::matching::{match_detections, MatchConfig, MatchStrategy};
use geo_eval::threshold::default_iou_thresholds;
use geo_eval::transform::{GeoTransform, RasterGeoreference};
use geo_eval::types::{GeometryCollection, GroundTruthRecord, RawDetection};

fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
    rectangle_from_corners(coord! { x: x, y: y }, coord! { x: x + side, y: y + side })
}

fn grid(n: usize, shift: impl Fn(usize) -> f64) -> Vec<Polygon<f64>> {
    (0..n)
        .map(|i| {
            let x = (i % 100) as f64 * 10.0;
            let y = (i / 100) as f64 * 10.0;
            square(x + shift(i), y, 8.0)
        })
        .collect()
}

#[test]
fn test_1000_perfect_matches() {
    let ground_truth = grid(1000, |_| 0.0);
    let predictions = grid(1000, |_| 0.0);

    let outcome = match_detections(&predictions, &ground_truth, 0.9, &MatchConfig::default()).unwrap();
    assert_eq!(outcome.true_positives, 1000);
    assert_eq!(outcome.false_positives, 0);
    assert_eq!(outcome.false_negatives, 0);
}

#[test]
fn test_1000_shifted_predictions_sweep() {
    // every prediction is shifted by 0..4 units along x: IoU 1.0, 0.78, 0.6, 0.45, 0.33
    let ground_truth = grid(1000, |_| 0.0);
    let predictions = grid(1000, |i| (i % 5) as f64);
    let thresholds = default_iou_thresholds();

    let curve = generate_pr_curve(
        &predictions,
        &ground_truth,
        &thresholds,
        &SweepConfig::default(),
        &MatchConfig::default(),
    );
    assert_eq!(curve.points.len(), 20);
    assert!(curve.failures.is_empty());

    // at 0.1 everything matches, at 0.9 only exact copies
    assert_eq!(curve.points[0].true_positives, 1000);
    assert_eq!(curve.points[19].true_positives, 200);
    assert!(curve.points.windows(2).all(|w| w[0].true_positives >= w[1].true_positives));
}

#[test]
fn test_index_and_parallel_agree_with_plain_scan() {
    let ground_truth = grid(1000, |_| 0.0);
    let mut predictions = grid(1000, |i| (i % 7) as f64 * 0.7);
    // dense clutter overlapping several ground-truth boxes
    predictions.extend((0..200).map(|i| square((i % 50) as f64 * 19.5 + 3.0, (i / 50) as f64 * 9.5 + 3.0, 9.0)));
    let thresholds = default_iou_thresholds();

    for strategy in [MatchStrategy::GreedyFirst, MatchStrategy::BestIou] {
        let plain = MatchConfig { strategy, spatial_index: false };
        let indexed = MatchConfig { strategy, spatial_index: true };
        let parallel = SweepConfig { parallel: true, ..SweepConfig::default() };

        let baseline = generate_pr_curve(&predictions, &ground_truth, &thresholds, &SweepConfig::default(), &plain);
        let fast = generate_pr_curve(&predictions, &ground_truth, &thresholds, &parallel, &indexed);
        assert_eq!(baseline, fast, "{:?}", strategy);
    }
}

#[test]
fn test_georeference_and_reproject_1000_detections() {
    let raw: Vec<RawDetection> = (0..1000)
        .map(|i| {
            let x = (i % 40) as f64 * 16.0;
            let y = (i / 40) as f64 * 16.0;
            RawDetection { class_id: 0, confidence: 0.5, bbox: [x, y, x + 12.0, y + 12.0] }
        })
        .collect();
    let utm = Crs::from_epsg(32718);
    let georef = RasterGeoreference::new(GeoTransform::new(0.5, 0.0, 712000.0, 0.0, -0.5, 8650000.0), utm);

    let native = georeference_detections(&raw, &georef, utm).unwrap();
    let geographic = georeference_detections(&raw, &georef, Crs::WGS84).unwrap();
    assert_eq!(geographic.len(), 1000);
    assert_eq!(geographic.crs, Some(Crs::WGS84));

    // evaluating the geographic copy against the native boxes aligns them back
    let ground_truth = GeometryCollection::new(
        Some(utm),
        native.records.iter().map(|d| GroundTruthRecord::new(d.geometry.clone())).collect(),
    );
    let mut config = EvalConfig::default();
    config.sweep.steps = 2;
    config.matching.spatial_index = true;

    let curve = evaluate_collections(geographic, &ground_truth, &config).unwrap();
    for point in &curve.points {
        assert_eq!(point.true_positives, 1000);
    }
}

//! Integration tests for the complete georeferenced evaluation pipeline.

use geo::{coord, Polygon};
use geo_eval::config::{EvalConfig, SweepConfig};
use geo_eval::crs::Crs;
use geo_eval::evaluator::{evaluate_collections, evaluate_files, generate_pr_curve, georeference_detections};
use geo_eval::export::write_to_file;
use geo_eval::geometry::rectangle_from_corners;
use geo_eval::matching::{match_detections, MatchConfig};
use geo_eval::transform::{GeoTransform, RasterGeoreference};
use geo_eval::types::{Detection, GeometryCollection, GroundTruthRecord, RawDetection};
use tempfile::tempdir;

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    rectangle_from_corners(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
}

fn scenario_c() -> (Vec<Polygon<f64>>, Vec<Polygon<f64>>) {
    let ground_truth = vec![square(0.0, 0.0, 10.0, 10.0), square(50.0, 50.0, 60.0, 60.0)];
    // IoU with the first ground truth is exactly 0.6
    let predictions = vec![square(0.0, 0.0, 10.0, 6.0)];
    (predictions, ground_truth)
}

#[test]
fn test_scenario_a_perfect_prediction() {
    let ground_truth = vec![square(0.0, 0.0, 10.0, 10.0)];
    let predictions = vec![square(0.0, 0.0, 10.0, 10.0)];

    let outcome = match_detections(&predictions, &ground_truth, 0.5, &MatchConfig::default()).unwrap();
    let pr = outcome.precision_recall();
    assert_eq!(pr.precision, 1.0);
    assert_eq!(pr.recall, 1.0);
}

#[test]
fn test_scenario_b_disjoint_prediction() {
    let ground_truth = vec![square(0.0, 0.0, 10.0, 10.0)];
    let predictions = vec![square(20.0, 20.0, 30.0, 30.0)];

    for threshold in [0.01, 0.1, 0.5, 0.9, 1.0] {
        let outcome = match_detections(&predictions, &ground_truth, threshold, &MatchConfig::default()).unwrap();
        let pr = outcome.precision_recall();
        assert_eq!(pr.precision, 0.0, "threshold {}", threshold);
        assert_eq!(pr.recall, 0.0, "threshold {}", threshold);
    }
}

#[test]
fn test_scenario_c_partial_recall() {
    let (predictions, ground_truth) = scenario_c();

    let outcome = match_detections(&predictions, &ground_truth, 0.5, &MatchConfig::default()).unwrap();
    assert_eq!(outcome.true_positives, 1);
    assert_eq!(outcome.false_negatives, 1);
    assert_eq!(outcome.false_positives, 0);

    let pr = outcome.precision_recall();
    assert_eq!(pr.precision, 1.0);
    assert_eq!(pr.recall, 0.5);
}

#[test]
fn test_scenario_d_threshold_sweep() {
    let (predictions, ground_truth) = scenario_c();

    let curve = generate_pr_curve(
        &predictions,
        &ground_truth,
        &[0.1, 0.5, 0.9],
        &SweepConfig::default(),
        &MatchConfig::default(),
    );
    assert_eq!(curve.points.len(), 3);
    assert!(curve.failures.is_empty());

    for point in &curve.points[..2] {
        assert_eq!(point.true_positives, 1);
        assert_eq!(point.precision, 1.0);
        assert_eq!(point.recall, 0.5);
    }

    let strict = &curve.points[2];
    assert_eq!(strict.iou_threshold, 0.9);
    assert_eq!(strict.true_positives, 0);
    assert_eq!(strict.false_negatives, 2);
    assert_eq!(strict.false_positives, 1);
    assert_eq!(strict.precision, 0.0);
    assert_eq!(strict.recall, 0.0);
}

#[test]
fn test_default_sweep_has_twenty_points() {
    let (predictions, ground_truth) = scenario_c();
    let gt = GeometryCollection::new(Some(Crs::from_epsg(32718)), ground_truth);
    let pred = GeometryCollection::new(Some(Crs::from_epsg(32718)), predictions);

    let curve = evaluate_collections(pred, &gt, &EvalConfig::default()).unwrap();
    assert_eq!(curve.points.len(), 20);
    assert!((curve.points[0].iou_threshold - 0.1).abs() < 1e-12);
    assert!((curve.points[19].iou_threshold - 0.9).abs() < 1e-12);
}

#[test]
fn test_predictions_are_aligned_to_ground_truth_crs() {
    // the same 10 m box expressed in UTM 18S and in geographic coordinates
    let utm = Crs::from_epsg(32718);
    let box_utm = square(712_000.0, 8_650_000.0, 712_010.0, 8_650_010.0);
    let gt = GeometryCollection::new(Some(utm), vec![GroundTruthRecord::new(box_utm.clone())]);

    let pred_utm = GeometryCollection::new(
        Some(utm),
        vec![Detection { class_id: 0, confidence: 0.9, geometry: box_utm }],
    );
    let pred_wgs84 = geo_eval::crs::reproject_collection(pred_utm, Crs::WGS84).unwrap();
    assert_eq!(pred_wgs84.crs, Some(Crs::WGS84));

    let mut config = EvalConfig::default();
    config.sweep.steps = 3;
    let curve = evaluate_collections(pred_wgs84, &gt, &config).unwrap();
    assert!(curve.points.iter().all(|p| p.recall == 1.0 && p.precision == 1.0));
}

#[test]
fn test_file_pipeline() {
    let dir = tempdir().unwrap();
    let crs = Crs::from_epsg(32718);
    let georef = RasterGeoreference::new(GeoTransform::new(0.1, 0.0, 500_000.0, 0.0, -0.1, 8_600_000.0), crs);

    let raw = vec![
        RawDetection { class_id: 0, confidence: 0.95, bbox: [0.0, 0.0, 100.0, 100.0] },
        RawDetection { class_id: 0, confidence: 0.40, bbox: [400.0, 400.0, 500.0, 500.0] },
    ];
    let predictions = georeference_detections(&raw, &georef, crs).unwrap();

    let ground_truth = GeometryCollection::new(
        Some(crs),
        vec![
            GroundTruthRecord::new(square(500_000.0, 8_599_990.0, 500_010.0, 8_600_000.0)),
            GroundTruthRecord::new(square(500_100.0, 8_599_900.0, 500_110.0, 8_599_910.0)),
        ],
    );

    let gt_path = dir.path().join("ground_truth.geojson");
    let pred_path = dir.path().join("predictions.geojson");
    write_to_file(&ground_truth, &gt_path).unwrap();
    write_to_file(&predictions, &pred_path).unwrap();

    let curve = evaluate_files(&gt_path, &pred_path, &EvalConfig::default()).unwrap();
    assert_eq!(curve.points.len(), 20);
    for point in &curve.points {
        assert_eq!(point.true_positives, 1);
        assert_eq!(point.false_positives, 1);
        assert_eq!(point.false_negatives, 1);
        assert_eq!(point.precision, 0.5);
        assert_eq!(point.recall, 0.5);
    }
}

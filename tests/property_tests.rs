//! Property-based tests using proptest
//!
//! These tests verify mathematical properties and invariants that should
//! always hold regardless of the input values.

use geo::{coord, Polygon};
use geo_eval::crs::{Crs, Reprojector};
use geo_eval::geometry::rectangle_from_corners;
use geo_eval::matching::{match_detections, MatchConfig, MatchStrategy};
use geo_eval::metrics::{calculate_f1_score, calculate_iou, calculate_precision_recall};
use geo_eval::transform::GeoTransform;
use proptest::prelude::*;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Polygon<f64> {
    rectangle_from_corners(coord! { x: x, y: y }, coord! { x: x + w, y: y + h })
}

// Property: Precision and recall should always be between 0.0 and 1.0
proptest! {
    #[test]
    fn prop_precision_recall_range(tp in 0usize..1000, fp in 0usize..1000, fn_ in 0usize..1000) {
        let pr = calculate_precision_recall(tp, fp, fn_);
        prop_assert!((0.0..=1.0).contains(&pr.precision), "precision {}", pr.precision);
        prop_assert!((0.0..=1.0).contains(&pr.recall), "recall {}", pr.recall);

        let f1 = calculate_f1_score(pr.precision, pr.recall);
        prop_assert!((0.0..=1.0).contains(&f1), "F1 {}", f1);
    }
}

// Property: IoU is symmetric and bounded
proptest! {
    #[test]
    fn prop_iou_symmetric_and_bounded(
        x1 in 0.0f64..100.0,
        y1 in 0.0f64..100.0,
        w1 in 1.0f64..50.0,
        h1 in 1.0f64..50.0,
        x2 in 0.0f64..100.0,
        y2 in 0.0f64..100.0,
        w2 in 1.0f64..50.0,
        h2 in 1.0f64..50.0,
    ) {
        let a = rect(x1, y1, w1, h1);
        let b = rect(x2, y2, w2, h2);

        let ab = calculate_iou(&a, &b).unwrap();
        let ba = calculate_iou(&b, &a).unwrap();

        prop_assert!((ab - ba).abs() < 1e-10, "IoU should be symmetric: {} vs {}", ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab), "IoU should be in [0,1], got {}", ab);
    }

    #[test]
    fn prop_disjoint_iou_is_zero(
        x in 0.0f64..100.0,
        y in 0.0f64..100.0,
        w in 1.0f64..50.0,
        h in 1.0f64..50.0,
        gap in 0.1f64..10.0,
    ) {
        let a = rect(x, y, w, h);
        let b = rect(x + w + gap, y, w, h);
        prop_assert_eq!(calculate_iou(&a, &b).unwrap(), 0.0);
    }
}

// Property: Self-IoU is 1 for non-degenerate geometry, rectangles and rotated quads alike
proptest! {
    #[test]
    fn prop_self_iou_is_one(
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
        w in 0.5f64..100.0,
        h in 0.5f64..100.0,
    ) {
        let a = rect(x, y, w, h);
        prop_assert!((calculate_iou(&a, &a).unwrap() - 1.0).abs() < 1e-12);

        let diamond = Polygon::new(
            vec![(x, y + h / 2.0), (x + w / 2.0, y), (x + w, y + h / 2.0), (x + w / 2.0, y + h), (x, y + h / 2.0)].into(),
            vec![],
        );
        prop_assert!((calculate_iou(&diamond, &diamond).unwrap() - 1.0).abs() < 1e-6);
    }
}

// Property: TP never increases with the threshold when every prediction
// overlaps at most one ground-truth record
proptest! {
    #[test]
    fn prop_tp_non_increasing_in_threshold(
        offsets in prop::collection::vec((-8.0f64..8.0, -8.0f64..8.0, 5.0f64..15.0), 1..20),
        extra_predictions in prop::collection::vec((0usize..20, -4.0f64..4.0), 0..10),
        best_iou in any::<bool>(),
    ) {
        // ground truth on a 100-unit grid, each 10x10
        let ground_truth: Vec<_> = (0..offsets.len()).map(|i| rect(i as f64 * 100.0, 0.0, 10.0, 10.0)).collect();
        let mut predictions: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, &(dx, dy, side))| rect(i as f64 * 100.0 + dx, dy, side, side))
            .collect();
        for &(i, d) in &extra_predictions {
            let i = i % offsets.len();
            predictions.push(rect(i as f64 * 100.0 + d, d, 10.0, 10.0));
        }

        let strategy = if best_iou { MatchStrategy::BestIou } else { MatchStrategy::GreedyFirst };
        let config = MatchConfig { strategy, ..MatchConfig::default() };

        let mut previous = usize::MAX;
        for step in 0..=20 {
            let threshold = step as f64 / 20.0;
            let tp = match_detections(&predictions, &ground_truth, threshold, &config).unwrap().true_positives;
            prop_assert!(tp <= previous, "TP rose from {} to {} at threshold {}", previous, tp, threshold);
            previous = tp;
        }
    }
}

// Property: the R-tree index never changes the outcome
proptest! {
    #[test]
    fn prop_index_matches_plain_scan(
        gts in prop::collection::vec((0.0f64..200.0, 0.0f64..200.0, 2.0f64..30.0), 0..30),
        preds in prop::collection::vec((0.0f64..200.0, 0.0f64..200.0, 2.0f64..30.0), 0..30),
        threshold in 0.0f64..=1.0,
    ) {
        let ground_truth: Vec<_> = gts.iter().map(|&(x, y, s)| rect(x, y, s, s)).collect();
        let predictions: Vec<_> = preds.iter().map(|&(x, y, s)| rect(x, y, s, s)).collect();

        let plain = match_detections(&predictions, &ground_truth, threshold, &MatchConfig::default()).unwrap();
        let indexed_config = MatchConfig { spatial_index: true, ..MatchConfig::default() };
        let indexed = match_detections(&predictions, &ground_truth, threshold, &indexed_config).unwrap();
        prop_assert_eq!(plain, indexed);
    }
}

// Property: pixel -> world -> pixel returns the original point
proptest! {
    #[test]
    fn prop_transform_round_trip(
        a in 0.01f64..10.0,
        e in -10.0f64..-0.01,
        b in -0.001f64..0.001,
        d in -0.001f64..0.001,
        c in -1.0e6f64..1.0e6,
        f in -1.0e7f64..1.0e7,
        col in 0.0f64..10000.0,
        row in 0.0f64..10000.0,
    ) {
        let t = GeoTransform::new(a, b, c, d, e, f);
        let inverse = t.inverse().unwrap();
        let back = inverse.apply(t.apply(coord! { x: col, y: row }));
        prop_assert!((back.x - col).abs() < 1e-6, "col {} came back as {}", col, back.x);
        prop_assert!((back.y - row).abs() < 1e-6, "row {} came back as {}", row, back.y);
    }
}

// Property: reprojection round trips within 1e-6 degrees
proptest! {
    #[test]
    fn prop_utm_round_trip(
        zone in 1u8..=60,
        south in any::<bool>(),
        dlon in -3.0f64..3.0,
        abs_lat in 1.0f64..70.0,
    ) {
        let lat = if south { -abs_lat } else { abs_lat };
        let lon = -183.0 + 6.0 * zone as f64 + dlon;
        let utm = Crs::utm(zone, south).unwrap();

        let forward = Reprojector::new(Crs::WGS84, utm).unwrap();
        let back = Reprojector::new(utm, Crs::WGS84).unwrap();
        let p = back.point(forward.point(coord! { x: lon, y: lat }).unwrap()).unwrap();

        prop_assert!((p.x - lon).abs() < 1e-6, "lon {} came back as {}", lon, p.x);
        prop_assert!((p.y - lat).abs() < 1e-6, "lat {} came back as {}", lat, p.y);
    }

    #[test]
    fn prop_web_mercator_round_trip(lon in -179.0f64..179.0, lat in -80.0f64..80.0) {
        let forward = Reprojector::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
        let back = Reprojector::new(Crs::WEB_MERCATOR, Crs::WGS84).unwrap();
        let p = back.point(forward.point(coord! { x: lon, y: lat }).unwrap()).unwrap();

        prop_assert!((p.x - lon).abs() < 1e-9);
        prop_assert!((p.y - lat).abs() < 1e-9);
    }
}

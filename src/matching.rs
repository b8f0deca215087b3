//! Matching of predictions to ground truth at a single IoU threshold.

use crate::error::Result;
use crate::metrics::iou::calculate_iou;
use crate::metrics::precision_recall::{calculate_precision_recall, PrecisionRecall};
use crate::threshold::validate_threshold;
use crate::types::{SpatialRecord, ThresholdPoint};
use geo::{BoundingRect, Polygon};
use log::debug;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};

/// How a ground-truth record picks among the predictions that clear the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Claim the first unmatched prediction in collection order.
    #[default]
    GreedyFirst,
    /// Claim the unmatched prediction with the highest IoU; earlier
    /// predictions win ties.
    BestIou,
}

/// Matching options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    pub strategy: MatchStrategy,
    /// Prune candidate pairs with an R-tree over prediction envelopes.
    pub spatial_index: bool,
}

/// A ground-truth record paired with the prediction that claimed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub ground_truth_index: usize,
    pub prediction_index: usize,
    pub iou: f64,
}

/// Result of matching two collections at one threshold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub matches: Vec<Match>,
}

impl MatchOutcome {
    pub fn precision_recall(&self) -> PrecisionRecall {
        calculate_precision_recall(self.true_positives, self.false_positives, self.false_negatives)
    }

    /// Summarise this outcome as a curve point for `iou_threshold`.
    pub fn to_threshold_point(&self, iou_threshold: f64) -> ThresholdPoint {
        let pr = self.precision_recall();
        ThresholdPoint {
            iou_threshold,
            precision: pr.precision,
            recall: pr.recall,
            true_positives: self.true_positives,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
        }
    }
}

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// R-tree over prediction bounding boxes.
pub struct PredictionIndex {
    tree: RTree<IndexedEnvelope>,
}

impl PredictionIndex {
    /// Index every prediction that has a bounding box.
    pub fn build<P: SpatialRecord>(predictions: &[P]) -> Self {
        let envelopes = predictions
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                p.geometry().bounding_rect().map(|r| {
                    GeomWithData::new(Rectangle::from_corners([r.min().x, r.min().y], [r.max().x, r.max().y]), i)
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Indices of predictions whose envelope touches `geometry`'s envelope,
    /// in ascending collection order.
    pub fn candidates(&self, geometry: &Polygon<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }
}

/// Match predictions to ground truth at one IoU threshold.
///
/// Ground-truth records are visited in collection order. Each one scans the
/// predictions in collection order and claims one still-unmatched
/// prediction whose IoU is at least `iou_threshold`: the first such
/// prediction under [`MatchStrategy::GreedyFirst`], the best one under
/// [`MatchStrategy::BestIou`]. A claimed prediction is never reconsidered.
///
/// Unclaimed predictions are false positives and unmatched ground-truth
/// records are false negatives. The matched flags live only for the
/// duration of this call.
///
/// # Errors
///
/// Returns an error if the threshold lies outside `[0.0, 1.0]` or an IoU
/// cannot be computed.
///
/// # Example
///
/// ```
/// use geo::coord;
/// use geo_eval::geometry::rectangle_from_corners;
/// use geo_eval::matching::{match_detections, MatchConfig};
///
/// let gt = vec![rectangle_from_corners(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 })];
/// let pred = gt.clone();
/// let outcome = match_detections(&pred, &gt, 0.5, &MatchConfig::default()).unwrap();
/// assert_eq!(outcome.true_positives, 1);
/// ```
pub fn match_detections<P: SpatialRecord, G: SpatialRecord>(
    predictions: &[P],
    ground_truth: &[G],
    iou_threshold: f64,
    config: &MatchConfig,
) -> Result<MatchOutcome> {
    validate_threshold(iou_threshold)?;

    let mut gt_matched = vec![false; ground_truth.len()];
    let mut pred_matched = vec![false; predictions.len()];
    let mut matches = Vec::new();

    // with a zero threshold every pair qualifies, including disjoint ones
    let index = if config.spatial_index && iou_threshold > 0.0 {
        Some(PredictionIndex::build(predictions))
    } else {
        None
    };

    for (gt_idx, gt) in ground_truth.iter().enumerate() {
        let candidates: Vec<usize> = match &index {
            Some(index) => index.candidates(gt.geometry()),
            None => (0..predictions.len()).collect(),
        };

        let mut chosen: Option<(usize, f64)> = None;
        for pred_idx in candidates {
            if pred_matched[pred_idx] {
                continue; // Already claimed
            }

            let iou = calculate_iou(predictions[pred_idx].geometry(), gt.geometry())?;
            if iou < iou_threshold {
                continue;
            }

            match config.strategy {
                MatchStrategy::GreedyFirst => {
                    chosen = Some((pred_idx, iou));
                    break;
                }
                MatchStrategy::BestIou => {
                    if chosen.map_or(true, |(_, best)| iou > best) {
                        chosen = Some((pred_idx, iou));
                    }
                }
            }
        }

        if let Some((pred_idx, iou)) = chosen {
            gt_matched[gt_idx] = true;
            pred_matched[pred_idx] = true;
            debug!("ground truth {} matched prediction {} (IoU {:.3})", gt_idx, pred_idx, iou);
            matches.push(Match {
                ground_truth_index: gt_idx,
                prediction_index: pred_idx,
                iou,
            });
        }
    }

    let true_positives = matches.len();
    Ok(MatchOutcome {
        true_positives,
        false_positives: pred_matched.iter().filter(|m| !**m).count(),
        false_negatives: gt_matched.iter().filter(|m| !**m).count(),
        matches,
    })
}

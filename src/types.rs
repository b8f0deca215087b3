//! Core data types for detections, ground truth and evaluation results.

use crate::crs::Crs;
use crate::error::{GeoEvalError, Result};
use crate::geometry::rectangle_from_corners;
use crate::metrics::f1_score::calculate_f1_score;
use crate::transform::GeoTransform;
use geo::{Coord, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category identifier of a ground-truth record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Id(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Id(id) => write!(f, "{}", id),
            Label::Text(text) => f.write_str(text),
        }
    }
}

/// One model output record in pixel space.
///
/// `bbox` is `[x1, y1, x2, y2]` with `(x1, y1)` the top-left and `(x2, y2)`
/// the bottom-right corner in pixel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: i64,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

impl RawDetection {
    /// Transform both corners into world space and build the covering box.
    pub fn georeference(&self, transform: &GeoTransform) -> Detection {
        let [x1, y1, x2, y2] = self.bbox;
        let top_left = transform.apply(Coord { x: x1, y: y1 });
        let bottom_right = transform.apply(Coord { x: x2, y: y2 });
        Detection {
            class_id: self.class_id,
            confidence: self.confidence,
            geometry: rectangle_from_corners(top_left, bottom_right),
        }
    }
}

/// A detection whose geometry has been built in world/CRS space.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: i64,
    pub confidence: f64,
    pub geometry: Polygon<f64>,
}

/// An annotated reference instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthRecord {
    pub label: Option<Label>,
    pub geometry: Polygon<f64>,
}

impl GroundTruthRecord {
    pub fn new(geometry: Polygon<f64>) -> Self {
        Self { label: None, geometry }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }
}

/// Attribute columns persisted alongside each geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A record that carries one polygon and can be persisted as a feature.
pub trait SpatialRecord: Sized {
    /// The record's geometry.
    fn geometry(&self) -> &Polygon<f64>;

    /// Replace the geometry, keeping every other attribute.
    fn with_geometry(self, geometry: Polygon<f64>) -> Self;

    /// Attributes written next to the geometry.
    fn properties(&self) -> FeatureProperties;

    /// Rebuild a record from a stored feature. `index` is the feature's
    /// position in its collection, used in error messages.
    fn from_feature(geometry: Polygon<f64>, properties: FeatureProperties, index: usize) -> Result<Self>;
}

impl SpatialRecord for Polygon<f64> {
    fn geometry(&self) -> &Polygon<f64> {
        self
    }

    fn with_geometry(self, geometry: Polygon<f64>) -> Self {
        geometry
    }

    fn properties(&self) -> FeatureProperties {
        FeatureProperties::default()
    }

    fn from_feature(geometry: Polygon<f64>, _properties: FeatureProperties, _index: usize) -> Result<Self> {
        Ok(geometry)
    }
}

impl SpatialRecord for Detection {
    fn geometry(&self) -> &Polygon<f64> {
        &self.geometry
    }

    fn with_geometry(self, geometry: Polygon<f64>) -> Self {
        Self { geometry, ..self }
    }

    fn properties(&self) -> FeatureProperties {
        FeatureProperties {
            label: None,
            class_id: Some(self.class_id),
            confidence: Some(self.confidence),
        }
    }

    fn from_feature(geometry: Polygon<f64>, properties: FeatureProperties, index: usize) -> Result<Self> {
        let class_id = properties
            .class_id
            .ok_or_else(|| GeoEvalError::MissingField(format!("feature {} has no class_id", index)))?;
        let confidence = properties
            .confidence
            .ok_or_else(|| GeoEvalError::MissingField(format!("feature {} has no confidence", index)))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(GeoEvalError::InvalidRecord(format!(
                "feature {} has confidence {} outside [0, 1]",
                index, confidence
            )));
        }
        Ok(Self { class_id, confidence, geometry })
    }
}

impl SpatialRecord for GroundTruthRecord {
    fn geometry(&self) -> &Polygon<f64> {
        &self.geometry
    }

    fn with_geometry(self, geometry: Polygon<f64>) -> Self {
        Self { geometry, ..self }
    }

    fn properties(&self) -> FeatureProperties {
        FeatureProperties {
            label: self.label.clone(),
            ..FeatureProperties::default()
        }
    }

    fn from_feature(geometry: Polygon<f64>, properties: FeatureProperties, _index: usize) -> Result<Self> {
        Ok(Self {
            label: properties.label,
            geometry,
        })
    }
}

/// An ordered sequence of records sharing one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryCollection<T> {
    pub crs: Option<Crs>,
    pub records: Vec<T>,
}

impl<T> GeometryCollection<T> {
    pub fn new(crs: Option<Crs>, records: Vec<T>) -> Self {
        Self { crs, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

impl<T> Default for GeometryCollection<T> {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

/// Precision and recall at one IoU threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPoint {
    pub iou_threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ThresholdPoint {
    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        calculate_f1_score(self.precision, self.recall)
    }
}

/// A threshold whose evaluation failed and was left out of the curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFailure {
    pub iou_threshold: f64,
    pub message: String,
}

/// Precision-recall curve over a sweep of IoU thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrCurve {
    /// Successful points in ascending threshold order.
    pub points: Vec<ThresholdPoint>,
    /// Thresholds that could not be evaluated.
    pub failures: Vec<ThresholdFailure>,
}

impl PrCurve {
    /// `(recall, precision)` pairs in threshold order, as plotted.
    pub fn recall_precision(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.recall, p.precision)).collect()
    }

    /// The point with the highest F1 score; the lowest threshold wins ties.
    pub fn best_f1(&self) -> Option<&ThresholdPoint> {
        self.points.iter().fold(None, |best: Option<&ThresholdPoint>, p| match best {
            Some(b) if b.f1() >= p.f1() => Some(b),
            _ => Some(p),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

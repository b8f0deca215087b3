//! Conversion of LabelMe annotations into ground-truth collections.
//!
//! Circle shapes (and shapes without a `shape_type`) become squares around
//! the first point; the radius is half the distance between the first two
//! points, scaled by [`AnnotationConfig::circle_scale`]. Rectangle shapes
//! become the box spanned by their two corners.
//!
//! Other shape types (`polygon`, `point`, `line`, ...) are skipped and
//! counted in [`ConversionStats::skipped_unsupported_shape`]. Legacy
//! shapefile exports treated every shape with at least two points as a
//! circle, so their record counts can be higher than the collections built
//! here for the same annotation file, and their rectangles are squares
//! rather than the spanned box.

use crate::config::AnnotationConfig;
use crate::error::{GeoEvalError, Result};
use crate::geometry::{circle_radius, rectangle_from_corners, square_around};
use crate::loader::load_labelme;
use crate::stats::ConversionStats;
use crate::transform::RasterGeoreference;
use crate::types::{GeometryCollection, GroundTruthRecord, Label};
use geo::{Coord, Polygon};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A LabelMe annotation document. Only the members used for conversion are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelMeDocument {
    #[serde(default)]
    pub shapes: Option<Vec<LabelMeShape>>,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// One annotated shape in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMeShape {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub shape_type: Option<String>,
}

impl LabelMeShape {
    fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("<unlabelled>")
    }
}

/// Convert every supported shape of `document` into a ground-truth record in
/// the raster's CRS.
///
/// Shapes with fewer than two points and unsupported shape types are skipped
/// with a warning and counted in the returned [`ConversionStats`].
///
/// # Errors
///
/// Returns `MissingField` when the document has no `shapes` member.
///
/// # Example
///
/// ```
/// use geo_eval::annotation::{labelme_to_ground_truth, LabelMeDocument};
/// use geo_eval::config::AnnotationConfig;
/// use geo_eval::crs::Crs;
/// use geo_eval::transform::{GeoTransform, RasterGeoreference};
///
/// let doc: LabelMeDocument = serde_json::from_str(
///     r#"{"shapes": [{"label": "palm", "points": [[100, 100], [110, 100]], "shape_type": "circle"}]}"#,
/// ).unwrap();
/// let georef = RasterGeoreference::new(GeoTransform::identity(), Crs::from_epsg(32718));
///
/// let (gt, stats) = labelme_to_ground_truth(&doc, &georef, &AnnotationConfig::default()).unwrap();
/// assert_eq!(gt.len(), 1);
/// assert_eq!(stats.converted, 1);
/// ```
pub fn labelme_to_ground_truth(
    document: &LabelMeDocument,
    georef: &RasterGeoreference,
    config: &AnnotationConfig,
) -> Result<(GeometryCollection<GroundTruthRecord>, ConversionStats)> {
    let shapes = document
        .shapes
        .as_ref()
        .ok_or_else(|| GeoEvalError::MissingField("LabelMe document has no 'shapes' member".to_string()))?;

    let mut stats = ConversionStats::new();
    let mut records = Vec::with_capacity(shapes.len());

    for (i, shape) in shapes.iter().enumerate() {
        stats.add_shape();

        if shape.points.len() < 2 {
            warn!(
                "Skipping shape {} ('{}'): {} point(s), need at least 2",
                i,
                shape.display_label(),
                shape.points.len()
            );
            stats.skip_insufficient_points();
            continue;
        }

        let p0 = Coord { x: shape.points[0][0], y: shape.points[0][1] };
        let p1 = Coord { x: shape.points[1][0], y: shape.points[1][1] };

        let geometry = match shape.shape_type.as_deref() {
            None | Some("circle") => circle_square(p0, p1, georef, config),
            Some("rectangle") => rectangle_from_corners(georef.transform.apply(p0), georef.transform.apply(p1)),
            Some(other) => {
                warn!(
                    "Skipping shape {} ('{}'): unsupported shape type '{}'",
                    i,
                    shape.display_label(),
                    other
                );
                stats.skip_unsupported_shape();
                continue;
            }
        };

        let mut record = GroundTruthRecord::new(geometry);
        if let Some(label) = &shape.label {
            record = record.with_label(Label::Text(label.clone()));
        }
        records.push(record);
        stats.record_converted();
    }

    Ok((GeometryCollection::new(Some(georef.crs), records), stats))
}

/// Load a LabelMe file and convert it with [`labelme_to_ground_truth`].
pub fn load_labelme_ground_truth<P: AsRef<Path>>(
    path: P,
    georef: &RasterGeoreference,
    config: &AnnotationConfig,
) -> Result<(GeometryCollection<GroundTruthRecord>, ConversionStats)> {
    let document = load_labelme(path)?;
    let converted = labelme_to_ground_truth(&document, georef, config)?;
    converted.1.log_summary();
    Ok(converted)
}

fn circle_square(
    center_px: Coord<f64>,
    edge_px: Coord<f64>,
    georef: &RasterGeoreference,
    config: &AnnotationConfig,
) -> Polygon<f64> {
    let center = georef.transform.apply(center_px);
    let radius = if config.radius_in_world_units {
        circle_radius(center, georef.transform.apply(edge_px))
    } else {
        circle_radius(center_px, edge_px)
    };
    square_around(center, radius, config.circle_scale)
}

//! Loading of geometry collections, raw detections and LabelMe annotations.
//!
//! Geometry collections are GeoJSON `FeatureCollection`s with an optional
//! legacy `crs` member:
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32718" } },
//!   "features": [
//!     {
//!       "type": "Feature",
//!       "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] },
//!       "properties": { "class_id": 0, "confidence": 0.91 }
//!     }
//!   ]
//! }
//! ```

use crate::annotation::LabelMeDocument;
use crate::crs::Crs;
use crate::error::{GeoEvalError, Result};
use crate::geometry::validate_polygon;
use crate::types::{Detection, FeatureProperties, GeometryCollection, GroundTruthRecord, RawDetection, SpatialRecord};
use geo::{Coord, LineString, Polygon};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<CrsMember>,
    pub features: Vec<FeatureDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum CrsMember {
    Named {
        #[serde(rename = "type")]
        kind: String,
        properties: CrsName,
    },
    Text(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CrsName {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FeatureDoc {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Option<GeometryDoc>,
    #[serde(default)]
    pub properties: Option<FeatureProperties>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeometryDoc {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

/// Load a geometry collection from a GeoJSON file.
///
/// # Errors
///
/// Returns `Input` if the file cannot be opened, and a parse or geometry
/// error if any feature is malformed. A single bad record fails the load.
///
/// # Example
///
/// ```no_run
/// use geo_eval::loader::load_from_file;
/// use geo_eval::types::GroundTruthRecord;
///
/// let gt = load_from_file::<GroundTruthRecord, _>("ground_truth.geojson").unwrap();
/// println!("Loaded {} records", gt.len());
/// ```
pub fn load_from_file<T: SpatialRecord, P: AsRef<Path>>(path: P) -> Result<GeometryCollection<T>> {
    let doc: FeatureCollectionDoc = read_json(path.as_ref())?;
    collection_from_doc(doc)
}

/// Load a geometry collection from a GeoJSON string.
///
/// # Example
///
/// ```
/// use geo_eval::loader::load_from_string;
/// use geo_eval::types::GroundTruthRecord;
///
/// let json = r#"{
///     "type": "FeatureCollection",
///     "crs": "EPSG:32718",
///     "features": []
/// }"#;
/// let gt = load_from_string::<GroundTruthRecord>(json).unwrap();
/// assert!(gt.is_empty());
/// ```
pub fn load_from_string<T: SpatialRecord>(json_str: &str) -> Result<GeometryCollection<T>> {
    let doc: FeatureCollectionDoc = serde_json::from_str(json_str)?;
    collection_from_doc(doc)
}

/// Load a ground-truth collection.
pub fn load_ground_truth<P: AsRef<Path>>(path: P) -> Result<GeometryCollection<GroundTruthRecord>> {
    load_from_file(path)
}

/// Load a prediction collection; every feature needs `class_id` and `confidence`.
pub fn load_detections<P: AsRef<Path>>(path: P) -> Result<GeometryCollection<Detection>> {
    load_from_file(path)
}

/// Load raw pixel-space detections from a JSON array.
pub fn load_raw_detections<P: AsRef<Path>>(path: P) -> Result<Vec<RawDetection>> {
    let detections: Vec<RawDetection> = read_json(path.as_ref())?;
    validate_raw_detections(&detections)?;
    Ok(detections)
}

/// Parse raw pixel-space detections from a JSON string.
pub fn raw_detections_from_string(json_str: &str) -> Result<Vec<RawDetection>> {
    let detections: Vec<RawDetection> = serde_json::from_str(json_str)?;
    validate_raw_detections(&detections)?;
    Ok(detections)
}

/// Load a LabelMe annotation document.
pub fn load_labelme<P: AsRef<Path>>(path: P) -> Result<LabelMeDocument> {
    read_json(path.as_ref())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| GeoEvalError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn validate_raw_detections(detections: &[RawDetection]) -> Result<()> {
    for (i, det) in detections.iter().enumerate() {
        if !(0.0..=1.0).contains(&det.confidence) {
            return Err(GeoEvalError::InvalidRecord(format!(
                "detection {} has confidence {} outside [0, 1]",
                i, det.confidence
            )));
        }
        if det.bbox.iter().any(|v| !v.is_finite()) {
            return Err(GeoEvalError::MalformedGeometry(format!(
                "detection {} has a non-finite bbox {:?}",
                i, det.bbox
            )));
        }
    }
    Ok(())
}

fn collection_from_doc<T: SpatialRecord>(doc: FeatureCollectionDoc) -> Result<GeometryCollection<T>> {
    if doc.kind != "FeatureCollection" {
        return Err(GeoEvalError::MalformedGeometry(format!(
            "expected a FeatureCollection, got '{}'",
            doc.kind
        )));
    }

    let crs = doc.crs.map(|member| match member {
        CrsMember::Named { properties, .. } => properties.name.parse::<Crs>(),
        CrsMember::Text(text) => text.parse::<Crs>(),
    });
    let crs = crs.transpose()?;

    let records = doc
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let geometry = feature
                .geometry
                .ok_or_else(|| GeoEvalError::MalformedGeometry(format!("feature {} has no geometry", i)))?;
            let polygon = polygon_from_doc(&geometry, i)?;
            T::from_feature(polygon, feature.properties.unwrap_or_default(), i)
        })
        .collect::<Result<Vec<T>>>()?;

    Ok(GeometryCollection::new(crs, records))
}

type Rings = Vec<Vec<Vec<f64>>>;

fn polygon_from_doc(geometry: &GeometryDoc, feature: usize) -> Result<Polygon<f64>> {
    let malformed = |e: serde_json::Error| {
        GeoEvalError::MalformedGeometry(format!("feature {} has invalid coordinates: {}", feature, e))
    };

    let rings: Rings = match geometry.kind.as_str() {
        "Polygon" => serde_json::from_value(geometry.coordinates.clone()).map_err(malformed)?,
        "MultiPolygon" => {
            let mut parts: Vec<Rings> = serde_json::from_value(geometry.coordinates.clone()).map_err(malformed)?;
            if parts.len() != 1 {
                return Err(GeoEvalError::MalformedGeometry(format!(
                    "feature {} is a MultiPolygon with {} parts, expected 1",
                    feature,
                    parts.len()
                )));
            }
            parts.remove(0)
        }
        other => {
            return Err(GeoEvalError::MalformedGeometry(format!(
                "feature {} has unsupported geometry type '{}'",
                feature, other
            )))
        }
    };

    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(ring) => ring_from_positions(ring, feature)?,
        None => {
            return Err(GeoEvalError::MalformedGeometry(format!(
                "feature {} polygon has no rings",
                feature
            )))
        }
    };
    let interiors = rings
        .map(|ring| ring_from_positions(ring, feature))
        .collect::<Result<Vec<_>>>()?;

    let polygon = Polygon::new(exterior, interiors);
    validate_polygon(&polygon)
        .map_err(|e| GeoEvalError::MalformedGeometry(format!("feature {}: {}", feature, e)))?;
    Ok(polygon)
}

fn ring_from_positions(positions: &[Vec<f64>], feature: usize) -> Result<LineString<f64>> {
    if positions.len() < 4 {
        return Err(GeoEvalError::MalformedGeometry(format!(
            "feature {} ring has {} positions, need at least 4",
            feature,
            positions.len()
        )));
    }

    let coords = positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeoEvalError::MalformedGeometry(format!(
                "feature {} has a position with {} values",
                feature,
                p.len()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    if coords.first() != coords.last() {
        return Err(GeoEvalError::MalformedGeometry(format!(
            "feature {} ring is not closed",
            feature
        )));
    }

    Ok(LineString::new(coords))
}

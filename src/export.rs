//! Writing geometry collections as GeoJSON.

use crate::error::Result;
use crate::loader::{CrsMember, CrsName, FeatureCollectionDoc, FeatureDoc, GeometryDoc};
use crate::types::{GeometryCollection, SpatialRecord};
use geo::Polygon;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialize a collection as a GeoJSON `FeatureCollection`.
///
/// The CRS, when present, is written as a legacy named `crs` member holding
/// its OGC URN.
pub fn to_geojson_string<T: SpatialRecord>(collection: &GeometryCollection<T>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_doc(collection)?)?)
}

/// Write a collection to `path` as GeoJSON, replacing any existing file.
pub fn write_to_file<T: SpatialRecord, P: AsRef<Path>>(collection: &GeometryCollection<T>, path: P) -> Result<()> {
    let doc = to_doc(collection)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn to_doc<T: SpatialRecord>(collection: &GeometryCollection<T>) -> Result<FeatureCollectionDoc> {
    let features = collection
        .iter()
        .map(|record| -> Result<FeatureDoc> {
            Ok(FeatureDoc {
                kind: "Feature".to_string(),
                geometry: Some(GeometryDoc {
                    kind: "Polygon".to_string(),
                    coordinates: serde_json::to_value(polygon_rings(record.geometry()))?,
                }),
                properties: Some(record.properties()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollectionDoc {
        kind: "FeatureCollection".to_string(),
        crs: collection.crs.map(|crs| CrsMember::Named {
            kind: "name".to_string(),
            properties: CrsName { name: crs.to_urn() },
        }),
        features,
    })
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

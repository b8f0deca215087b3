//! Coordinate reference systems and reprojection.
//!
//! CRSs are identified by EPSG code. Any code can be carried through
//! loading, comparison and export; reprojection is available for the
//! projections a detection pipeline typically meets:
//!
//! - `EPSG:4326` / `OGC:CRS84` : WGS 84 longitude/latitude in degrees (x = longitude)
//! - `EPSG:3857` : Web Mercator
//! - `EPSG:32601`–`32660` / `32701`–`32760` : WGS 84 / UTM north / south zones
//!
//! Points are reprojected through geographic WGS 84 coordinates.

use crate::error::{GeoEvalError, Result};
use crate::types::{GeometryCollection, SpatialRecord};
use geo::{Coord, MapCoords, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Crs = Crs { epsg: 4326 };
    /// Web Mercator.
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };

    /// Create a CRS from an EPSG code.
    pub fn from_epsg(epsg: u32) -> Self {
        Self { epsg }
    }

    /// WGS 84 / UTM zone `zone` (1..=60) in the given hemisphere.
    pub fn utm(zone: u8, south: bool) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            return Err(GeoEvalError::MalformedCrs(format!("UTM zone {} out of range 1..=60", zone)));
        }
        let base = if south { 32700 } else { 32600 };
        Ok(Self::from_epsg(base + zone as u32))
    }

    /// The EPSG code.
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// OGC URN form used in GeoJSON `crs` members.
    pub fn to_urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }

    /// The projection backing this CRS, if reprojection is supported for it.
    pub fn projection(&self) -> Result<Projection> {
        match self.epsg {
            4326 => Ok(Projection::Geographic),
            3857 => Ok(Projection::WebMercator),
            code @ 32601..=32660 => Ok(Projection::Utm { zone: (code - 32600) as u8, south: false }),
            code @ 32701..=32760 => Ok(Projection::Utm { zone: (code - 32700) as u8, south: true }),
            code => Err(GeoEvalError::UnsupportedCrs(code)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = GeoEvalError;

    /// Accepts `EPSG:32718`, `epsg:32718`, `urn:ogc:def:crs:EPSG::32718`,
    /// `urn:ogc:def:crs:EPSG:9.9:32718` and the CRS84 URN.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper == "CRS84" || upper == "OGC:CRS84" || upper == "URN:OGC:DEF:CRS:OGC:1.3:CRS84" {
            return Ok(Crs::WGS84);
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
            // optional version between the authority and the code
            rest.rsplit(':').next().unwrap_or(rest)
        } else {
            return Err(GeoEvalError::MalformedCrs(format!("'{}' is not an EPSG identifier", trimmed)));
        };

        code.parse::<u32>()
            .map(Crs::from_epsg)
            .map_err(|_| GeoEvalError::MalformedCrs(format!("'{}' has no numeric EPSG code", trimmed)))
    }
}

impl TryFrom<String> for Crs {
    type Error = GeoEvalError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

/// Map projections supported for reprojection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Spherical Mercator on the WGS 84 semi-major axis.
    WebMercator,
    /// Transverse Mercator on WGS 84 with UTM parameters.
    Utm { zone: u8, south: bool },
}

impl Projection {
    /// Convert projected coordinates to `(longitude, latitude)` in degrees.
    pub fn to_geographic(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Projection::Geographic => c,
            Projection::WebMercator => Coord {
                x: (c.x / WGS84_A).to_degrees(),
                y: (2.0 * (c.y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees(),
            },
            Projection::Utm { zone, south } => utm_inverse(c, zone, south),
        }
    }

    /// Convert `(longitude, latitude)` in degrees to projected coordinates.
    pub fn from_geographic(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Projection::Geographic => c,
            Projection::WebMercator => Coord {
                x: WGS84_A * c.x.to_radians(),
                y: WGS84_A * (std::f64::consts::FRAC_PI_4 + c.y.to_radians() / 2.0).tan().ln(),
            },
            Projection::Utm { zone, south } => utm_forward(c, zone, south),
        }
    }
}

fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

fn utm_forward(c: Coord<f64>, zone: u8, south: bool) -> Coord<f64> {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);

    let phi = c.y.to_radians();
    let dlam = (c.x - central_meridian(zone)).to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = phi.tan().powi(2);
    let cc = ep2 * cos_phi * cos_phi;
    let a = cos_phi * dlam;
    let m = meridian_arc(phi, e2);

    let x = UTM_K0
        * n
        * (a + (1.0 - t + cc) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * cc - 58.0 * ep2) * a.powi(5) / 120.0);
    let y = UTM_K0
        * (m + n
            * phi.tan()
            * (a * a / 2.0
                + (5.0 - t + 9.0 * cc + 4.0 * cc * cc) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * cc - 330.0 * ep2) * a.powi(6) / 720.0));

    Coord {
        x: x + UTM_FALSE_EASTING,
        y: if south { y + UTM_FALSE_NORTHING_SOUTH } else { y },
    }
}

fn utm_inverse(c: Coord<f64>, zone: u8, south: bool) -> Coord<f64> {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    let x = c.x - UTM_FALSE_EASTING;
    let y = if south { c.y - UTM_FALSE_NORTHING_SOUTH } else { c.y };

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = phi1.tan().powi(2);
    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = WGS84_A / denom.sqrt();
    let r1 = WGS84_A * (1.0 - e2) / denom.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let phi = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lam = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
        / cos_phi1;

    Coord {
        x: central_meridian(zone) + lam.to_degrees(),
        y: phi.to_degrees(),
    }
}

/// Reprojects coordinates from one CRS to another.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    source: Crs,
    target: Crs,
    from: Projection,
    to: Projection,
}

impl Reprojector {
    /// Build a reprojector, failing if either CRS is unsupported.
    ///
    /// Identical source and target CRSs are always accepted and reproject as
    /// the identity, even for codes without a known projection.
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        let (from, to) = if source == target {
            (Projection::Geographic, Projection::Geographic)
        } else {
            (source.projection()?, target.projection()?)
        };
        Ok(Self { source, target, from, to })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    /// Whether this reprojector leaves coordinates untouched.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Reproject one point.
    pub fn point(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        if self.is_identity() {
            return Ok(c);
        }
        let out = self.to.from_geographic(self.from.to_geographic(c));
        if out.x.is_finite() && out.y.is_finite() {
            Ok(out)
        } else {
            Err(GeoEvalError::ReprojectionFailed(format!(
                "({}, {}) from {} to {} is not finite",
                c.x, c.y, self.source, self.target
            )))
        }
    }

    /// Reproject every vertex of a polygon.
    pub fn polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        polygon.try_map_coords(|c| self.point(c))
    }

    /// Reproject a collection into the target CRS.
    ///
    /// A collection without a declared CRS is assumed to be in the source CRS.
    pub fn collection<T: SpatialRecord>(&self, collection: GeometryCollection<T>) -> Result<GeometryCollection<T>> {
        if let Some(declared) = collection.crs {
            if declared != self.source {
                return Err(GeoEvalError::CrsMismatch {
                    expected: self.source.to_string(),
                    found: declared.to_string(),
                });
            }
        }

        let mut records = Vec::with_capacity(collection.records.len());
        for record in collection.records {
            let geometry = self.polygon(record.geometry())?;
            records.push(record.with_geometry(geometry));
        }
        Ok(GeometryCollection::new(Some(self.target), records))
    }
}

/// Reproject a collection to `target`, using its declared CRS as the source.
///
/// # Errors
///
/// Returns `MissingField` when the collection declares no CRS.
pub fn reproject_collection<T: SpatialRecord>(
    collection: GeometryCollection<T>,
    target: Crs,
) -> Result<GeometryCollection<T>> {
    let source = collection
        .crs
        .ok_or_else(|| GeoEvalError::MissingField("collection has no CRS to reproject from".to_string()))?;
    Reprojector::new(source, target)?.collection(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_parse_variants() {
        assert_eq!("EPSG:32718".parse::<Crs>().unwrap().epsg(), 32718);
        assert_eq!("epsg:4326".parse::<Crs>().unwrap(), Crs::WGS84);
        assert_eq!("urn:ogc:def:crs:EPSG::32718".parse::<Crs>().unwrap().epsg(), 32718);
        assert_eq!("urn:ogc:def:crs:EPSG:6.6:3857".parse::<Crs>().unwrap(), Crs::WEB_MERCATOR);
        assert_eq!("urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(), Crs::WGS84);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("WGS84".parse::<Crs>(), Err(GeoEvalError::MalformedCrs(_))));
        assert!(matches!("EPSG:abc".parse::<Crs>(), Err(GeoEvalError::MalformedCrs(_))));
    }

    #[test]
    fn test_display_and_urn() {
        let crs = Crs::utm(18, true).unwrap();
        assert_eq!(crs.to_string(), "EPSG:32718");
        assert_eq!(crs.to_urn(), "urn:ogc:def:crs:EPSG::32718");
    }

    #[test]
    fn test_projection_lookup() {
        assert_eq!(
            Crs::from_epsg(32718).projection().unwrap(),
            Projection::Utm { zone: 18, south: true }
        );
        assert!(matches!(Crs::from_epsg(2154).projection(), Err(GeoEvalError::UnsupportedCrs(2154))));
    }

    #[test]
    fn test_utm_central_meridian_on_equator() {
        let north = utm_forward(coord! { x: -75.0, y: 0.0 }, 18, false);
        assert!((north.x - 500_000.0).abs() < 1e-6);
        assert!(north.y.abs() < 1e-6);

        let south = utm_forward(coord! { x: -75.0, y: 0.0 }, 18, true);
        assert!((south.y - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_utm_symmetric_about_central_meridian() {
        let west = utm_forward(coord! { x: -76.0, y: -12.0 }, 18, true);
        let east = utm_forward(coord! { x: -74.0, y: -12.0 }, 18, true);
        assert!(((500_000.0 - west.x) - (east.x - 500_000.0)).abs() < 1e-6);
        assert!((west.y - east.y).abs() < 1e-6);
    }

    #[test]
    fn test_utm_round_trip() {
        let lonlat = coord! { x: -77.03, y: -12.05 };
        let projected = utm_forward(lonlat, 18, true);
        let back = utm_inverse(projected, 18, true);
        assert!((back.x - lonlat.x).abs() < 1e-7);
        assert!((back.y - lonlat.y).abs() < 1e-7);
    }

    #[test]
    fn test_web_mercator_extent() {
        let p = Projection::WebMercator.from_geographic(coord! { x: 180.0, y: 0.0 });
        assert!((p.x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_identity_reprojector_for_unknown_code() {
        let crs = Crs::from_epsg(2154);
        let r = Reprojector::new(crs, crs).unwrap();
        let c = coord! { x: 1.0, y: 2.0 };
        assert_eq!(r.point(c).unwrap(), c);
    }

    #[test]
    fn test_non_finite_result_is_an_error() {
        let r = Reprojector::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
        assert!(matches!(
            r.point(coord! { x: f64::NAN, y: 10.0 }),
            Err(GeoEvalError::ReprojectionFailed(_))
        ));
    }
}

//! Affine pixel-to-world coordinate transforms.
//!
//! A georeferenced raster carries a six-parameter affine transform mapping
//! pixel indices `(col, row)` to world coordinates:
//!
//! ```text
//! x' = a * col + b * row + c
//! y' = d * col + e * row + f
//! ```
//!
//! For a north-up image `a` is the pixel width, `e` the (negative) pixel
//! height, `b`/`d` are zero and `(c, f)` is the upper-left corner.

use crate::crs::Crs;
use crate::error::{GeoEvalError, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Six-parameter affine transform in raster order `(a, b, c, d, e, f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    /// Create a transform from the six raster coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform (pixel space is world space).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Create a transform from a GDAL geotransform `[c, a, b, f, d, e]`.
    ///
    /// # Example
    ///
    /// ```
    /// use geo_eval::transform::GeoTransform;
    ///
    /// let t = GeoTransform::from_gdal([500000.0, 0.5, 0.0, 8600000.0, 0.0, -0.5]);
    /// assert_eq!(t.a, 0.5);
    /// assert_eq!(t.f, 8600000.0);
    /// ```
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// Parse an ESRI world file (`.tfw`, `.jgw`, `.pgw`, ...).
    ///
    /// The six lines are `A, D, B, E, C, F`, where `(C, F)` is the centre of
    /// the upper-left pixel. The returned transform is corner-referenced, so
    /// pixel `(0, 0)` maps to the outer corner of the image.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when fewer than six values are present and
    /// `MalformedGeometry` when a value is not a number.
    pub fn from_world_file(text: &str) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    GeoEvalError::MalformedGeometry(format!("world file value '{}' is not a number", token))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() < 6 {
            return Err(GeoEvalError::MissingField(format!(
                "world file needs 6 values, got {}",
                values.len()
            )));
        }

        let (a, d, b, e, cx, cy) = (values[0], values[1], values[2], values[3], values[4], values[5]);
        // shift the pixel-centre reference to the pixel corner
        let c = cx - 0.5 * a - 0.5 * b;
        let f = cy - 0.5 * d - 0.5 * e;
        Ok(Self::new(a, b, c, d, e, f))
    }

    /// Apply the transform to a pixel-space point.
    ///
    /// # Example
    ///
    /// ```
    /// use geo::coord;
    /// use geo_eval::transform::GeoTransform;
    ///
    /// let t = GeoTransform::new(0.5, 0.0, 1000.0, 0.0, -0.5, 2000.0);
    /// let world = t.apply(coord! { x: 10.0, y: 20.0 });
    /// assert_eq!(world, coord! { x: 1005.0, y: 1990.0 });
    /// ```
    pub fn apply(&self, pixel: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.a * pixel.x + self.b * pixel.y + self.c,
            y: self.d * pixel.x + self.e * pixel.y + self.f,
        }
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse transform (world to pixel), or `None` if the transform is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(Self::new(
            ia,
            ib,
            -(ia * self.c + ib * self.f),
            id,
            ie,
            -(id * self.c + ie * self.f),
        ))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Georeference of a raster: its affine transform and the CRS that
/// transform maps into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGeoreference {
    pub transform: GeoTransform,
    pub crs: Crs,
}

impl RasterGeoreference {
    pub fn new(transform: GeoTransform, crs: Crs) -> Self {
        Self { transform, crs }
    }
}

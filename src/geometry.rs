//! Construction and validation of axis-aligned bounding polygons.

use crate::error::{GeoEvalError, Result};
use geo::{Area, BoundingRect, Coord, LineString, Polygon, Rect};

/// Build the minimal axis-aligned rectangle covering two corner points.
///
/// The corners may be given in any order; zero-area rectangles are allowed
/// and produce an empty-area polygon.
///
/// # Example
///
/// ```
/// use geo::{coord, Area};
/// use geo_eval::geometry::rectangle_from_corners;
///
/// let poly = rectangle_from_corners(coord! { x: 10.0, y: 0.0 }, coord! { x: 0.0, y: 5.0 });
/// assert_eq!(poly.unsigned_area(), 50.0);
/// ```
pub fn rectangle_from_corners(p1: Coord<f64>, p2: Coord<f64>) -> Polygon<f64> {
    Rect::new(p1, p2).to_polygon()
}

/// Half the Euclidean distance between two annotated points.
pub fn circle_radius(p1: Coord<f64>, p2: Coord<f64>) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y) / 2.0
}

/// Build the square `box(cx - r*s, cy - r*s, cx + r*s, cy + r*s)` around a
/// circular annotation.
///
/// `scale` inflates (> 1) or shrinks (< 1) the square relative to the
/// measured radius.
pub fn square_around(center: Coord<f64>, radius: f64, scale: f64) -> Polygon<f64> {
    let half = radius * scale;
    rectangle_from_corners(
        Coord { x: center.x - half, y: center.y - half },
        Coord { x: center.x + half, y: center.y + half },
    )
}

/// Check that a polygon is usable for area computations.
///
/// Every ring must have at least four coordinates and all coordinates must be
/// finite.
pub fn validate_polygon(polygon: &Polygon<f64>) -> Result<()> {
    validate_ring(polygon.exterior(), "exterior")?;
    for (i, ring) in polygon.interiors().iter().enumerate() {
        validate_ring(ring, &format!("interior {}", i))?;
    }
    Ok(())
}

fn validate_ring(ring: &LineString<f64>, name: &str) -> Result<()> {
    if ring.0.len() < 4 {
        return Err(GeoEvalError::MalformedGeometry(format!(
            "{} ring has {} coordinates, need at least 4",
            name,
            ring.0.len()
        )));
    }
    if let Some(c) = ring.0.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeoEvalError::MalformedGeometry(format!(
            "{} ring has non-finite coordinate ({}, {})",
            name, c.x, c.y
        )));
    }
    Ok(())
}

/// Return the rectangle a polygon describes when it is exactly an
/// axis-aligned box without holes.
pub fn axis_aligned_rect(polygon: &Polygon<f64>) -> Option<Rect<f64>> {
    if !polygon.interiors().is_empty() || polygon.exterior().0.len() != 5 {
        return None;
    }
    let rect = polygon.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());

    let on_corners = polygon.exterior().coords().all(|c| {
        (c.x == min.x || c.x == max.x) && (c.y == min.y || c.y == max.y)
    });
    if !on_corners {
        return None;
    }

    // rejects bow-ties that visit all four corners
    let expected = rect.width() * rect.height();
    let area = polygon.unsigned_area();
    if (area - expected).abs() <= 1e-12 * expected.max(1.0) {
        Some(rect)
    } else {
        None
    }
}

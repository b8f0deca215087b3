//! Intersection over Union (IoU) calculation for polygons.

use crate::error::{GeoEvalError, Result};
use crate::geometry::axis_aligned_rect;
use geo::{Area, BooleanOps, Polygon, Rect};

/// Calculate the Intersection over Union (IoU) between two polygons.
///
/// IoU is the area of intersection divided by the area of union, and 0.0
/// whenever the union area is zero. A zero-area polygon therefore has IoU
/// 0.0 with everything.
///
/// Axis-aligned rectangles are handled in closed form; other polygons go
/// through boolean overlay.
///
/// # Errors
///
/// Returns `GeometryOperation` when an area is not finite.
///
/// # Example
///
/// ```
/// use geo::coord;
/// use geo_eval::geometry::rectangle_from_corners;
/// use geo_eval::metrics::iou::calculate_iou;
///
/// let a = rectangle_from_corners(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
/// let b = rectangle_from_corners(coord! { x: 5.0, y: 5.0 }, coord! { x: 15.0, y: 15.0 });
/// let iou = calculate_iou(&a, &b).unwrap();
/// assert!(iou > 0.0 && iou < 1.0);
/// ```
pub fn calculate_iou(a: &Polygon<f64>, b: &Polygon<f64>) -> Result<f64> {
    if let (Some(ra), Some(rb)) = (axis_aligned_rect(a), axis_aligned_rect(b)) {
        return Ok(rect_iou(&ra, &rb));
    }

    let area_a = a.unsigned_area();
    let area_b = b.unsigned_area();
    if !area_a.is_finite() || !area_b.is_finite() {
        return Err(GeoEvalError::GeometryOperation(format!(
            "polygon areas {} and {} are not finite",
            area_a, area_b
        )));
    }
    if area_a == 0.0 || area_b == 0.0 {
        return Ok(0.0);
    }

    let intersection_area = a.intersection(b).unsigned_area();
    let union_area = area_a + area_b - intersection_area;

    if union_area <= 0.0 {
        return Ok(0.0);
    }

    let iou = intersection_area / union_area;
    if !iou.is_finite() {
        return Err(GeoEvalError::GeometryOperation(format!(
            "IoU of {} / {} is not finite",
            intersection_area, union_area
        )));
    }

    // overlay rounding can push identical shapes a hair past 1
    Ok(iou.clamp(0.0, 1.0))
}

/// IoU of two axis-aligned rectangles.
pub fn rect_iou(a: &Rect<f64>, b: &Rect<f64>) -> f64 {
    // Calculate intersection coordinates
    let x_left = a.min().x.max(b.min().x);
    let y_bottom = a.min().y.max(b.min().y);
    let x_right = a.max().x.min(b.max().x);
    let y_top = a.max().y.min(b.max().y);

    // If there's no intersection
    if x_right < x_left || y_top < y_bottom {
        return 0.0;
    }

    let intersection_area = (x_right - x_left) * (y_top - y_bottom);
    let union_area = a.width() * a.height() + b.width() * b.height() - intersection_area;

    // Avoid division by zero
    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

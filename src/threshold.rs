//! IoU threshold generation and validation.

use crate::error::{GeoEvalError, Result};

/// Default first threshold of the sweep.
pub const DEFAULT_START: f64 = 0.1;
/// Default last threshold of the sweep.
pub const DEFAULT_END: f64 = 0.9;
/// Default number of thresholds in the sweep.
pub const DEFAULT_STEPS: usize = 20;

/// Generate a range of evenly spaced threshold values over `[start, end]`.
///
/// Both ends are included.
///
/// # Errors
///
/// Returns an error if `steps` is zero, either bound lies outside
/// `[0.0, 1.0]`, or `start > end`.
///
/// # Example
///
/// ```
/// use geo_eval::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.0, 1.0, 11).unwrap();
/// assert_eq!(thresholds.len(), 11);
/// assert_eq!(thresholds[0], 0.0);
/// assert_eq!(thresholds[10], 1.0);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(GeoEvalError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string()
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(GeoEvalError::InvalidThreshold(
            format!("Start threshold ({}) must be <= end threshold ({})", start, end)
        ));
    }

    Ok(linspace(start, end, steps))
}

/// The default sweep: 20 thresholds linearly spaced over `[0.1, 0.9]`.
///
/// Identical to `generate_threshold_range(DEFAULT_START, DEFAULT_END, DEFAULT_STEPS)`.
pub fn default_iou_thresholds() -> Vec<f64> {
    linspace(DEFAULT_START, DEFAULT_END, DEFAULT_STEPS)
}

/// `steps` values from `start` to `end`; the last one is exactly `end`.
fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps == 1 {
        return vec![start];
    }

    let step_size = (end - start) / (steps - 1) as f64;
    (0..steps)
        .map(|i| if i == steps - 1 { end } else { start + step_size * i as f64 })
        .collect()
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
///
/// NaN is rejected.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(GeoEvalError::InvalidThreshold(
            format!("Threshold must be between 0.0 and 1.0, got {}", threshold)
        ));
    }
    Ok(())
}

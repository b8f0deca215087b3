/// Statistics tracking for annotation conversion
///
/// This module provides structures for counting the shapes that were
/// converted into ground truth and the ones that had to be skipped.

use log::info;
use serde::{Deserialize, Serialize};

/// Statistics collected while converting LabelMe shapes into ground truth
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total number of shapes seen
    pub total_shapes: usize,

    /// Number of shapes turned into ground-truth records
    pub converted: usize,

    /// Number of shapes skipped because they had fewer than two points
    pub skipped_insufficient_points: usize,

    /// Number of shapes skipped because their shape type is not supported
    pub skipped_unsupported_shape: usize,
}

impl ConversionStats {
    /// Create a new `ConversionStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shape(&mut self) {
        self.total_shapes += 1;
    }

    pub fn record_converted(&mut self) {
        self.converted += 1;
    }

    pub fn skip_insufficient_points(&mut self) {
        self.skipped_insufficient_points += 1;
    }

    pub fn skip_unsupported_shape(&mut self) {
        self.skipped_unsupported_shape += 1;
    }

    /// Calculate the total number of skipped shapes
    pub fn total_skipped(&self) -> usize {
        self.skipped_insufficient_points + self.skipped_unsupported_shape
    }

    /// Log a summary of the statistics at info level
    pub fn log_summary(&self) {
        info!(
            "Converted {} of {} shapes ({} with too few points, {} unsupported)",
            self.converted,
            self.total_shapes,
            self.skipped_insufficient_points,
            self.skipped_unsupported_shape
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = ConversionStats::new();
        assert_eq!(stats.total_shapes, 0);
        assert_eq!(stats.converted, 0);
        assert_eq!(stats.total_skipped(), 0);
    }

    #[test]
    fn test_skip_counters() {
        let mut stats = ConversionStats::new();
        for _ in 0..3 {
            stats.add_shape();
        }
        stats.record_converted();
        stats.skip_insufficient_points();
        stats.skip_unsupported_shape();

        assert_eq!(stats.total_shapes, 3);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.total_skipped(), 2);
    }
}

//! Observation quality scoring.
//!
//! Each detection gets a confidence multiplier in `[0, 1]` combining how
//! large the marker appears (bigger means closer and better resolved) with
//! how square its corner quad is (skew hints at oblique views or corner
//! noise).

use serde::{Deserialize, Serialize};

use marker_pose_core::DetectedMarker;

/// Quality scoring settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QualityParams {
    /// Bounding-box area (square pixels) at which the size component
    /// saturates to 1. A 150 px side fills the default.
    pub reference_area_px: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            reference_area_px: 22_500.0,
        }
    }
}

/// Size component: bounding-box area against the reference, clamped.
pub fn size_score(marker: &DetectedMarker, params: &QualityParams) -> f64 {
    if params.reference_area_px <= 0.0 {
        return 0.0;
    }
    (marker.bounding_area() / params.reference_area_px).clamp(0.0, 1.0)
}

/// Shape component: 1 for a perfect square, falling toward 0 with the worst
/// relative side-length deviation.
pub fn shape_score(marker: &DetectedMarker) -> f64 {
    let sides = marker.side_lengths();
    let avg = sides.iter().sum::<f64>() / 4.0;
    if !(avg.is_finite() && avg > f64::EPSILON) {
        return 0.0;
    }
    let max_dev = sides.iter().map(|s| (s - avg).abs()).fold(0.0, f64::max);
    (1.0 - max_dev / avg).max(0.0)
}

/// Final score: mean of the size and shape components.
pub fn quality_score(marker: &DetectedMarker, params: &QualityParams) -> f64 {
    0.5 * (size_score(marker, params) + shape_score(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(side: f64) -> DetectedMarker {
        DetectedMarker::new(
            0,
            [
                Point2::new(0.0, 0.0),
                Point2::new(side, 0.0),
                Point2::new(side, side),
                Point2::new(0.0, side),
            ],
        )
    }

    #[test]
    fn exact_square_scores_one_on_shape() {
        assert_relative_eq!(shape_score(&square(120.0)), 1.0);
    }

    #[test]
    fn perturbed_corner_scores_below_one() {
        let mut m = square(120.0);
        m.corners[2] += nalgebra::Vector2::new(25.0, 10.0);
        assert!(shape_score(&m) < 1.0);
    }

    #[test]
    fn size_saturates_at_reference_area() {
        let p = QualityParams::default();
        assert_relative_eq!(size_score(&square(150.0), &p), 1.0);
        assert_relative_eq!(size_score(&square(300.0), &p), 1.0);
        assert_relative_eq!(size_score(&square(75.0), &p), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn final_score_is_component_mean() {
        let p = QualityParams::default();
        let m = square(75.0); // size 0.25, shape 1.0
        assert_relative_eq!(quality_score(&m, &p), 0.625, epsilon = 1e-12);
    }

    #[test]
    fn saturated_square_scores_exactly_one() {
        let p = QualityParams::default();
        assert_relative_eq!(quality_score(&square(200.0), &p), 1.0);
    }
}

//! Interchangeable solver strategies.
//!
//! Call sites depend on the [`PoseSolver`] capability; the concrete strategy
//! is picked once from configuration via [`SolverKind::build`].

use serde::{Deserialize, Serialize};

use marker_pose_core::{CameraIntrinsics, DetectedMarker, MarkerWorldEntry, PoseEstimate};

use crate::geometric::solve_geometric;
use crate::perspective::solve_perspective;

/// One-marker pose recovery capability.
pub trait PoseSolver: Send + Sync {
    /// `None` means no candidate for this marker in this frame -- a normal
    /// outcome, not an error. There is no cross-frame retry.
    fn solve(
        &self,
        marker: &DetectedMarker,
        entry: &MarkerWorldEntry,
        intrinsics: &CameraIntrinsics,
    ) -> Option<PoseEstimate>;

    fn name(&self) -> &'static str;
}

/// Perspective solve with a geometric fallback when the solve fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct RobustSolver;

impl PoseSolver for RobustSolver {
    fn solve(
        &self,
        marker: &DetectedMarker,
        entry: &MarkerWorldEntry,
        intrinsics: &CameraIntrinsics,
    ) -> Option<PoseEstimate> {
        if let Some(pose) = solve_perspective(marker, entry, intrinsics) {
            return Some(pose);
        }
        log::trace!(
            "marker {}: perspective solve failed, using geometric fallback",
            marker.id
        );
        solve_geometric(marker, entry, intrinsics)
    }

    fn name(&self) -> &'static str {
        "robust"
    }
}

/// Geometric estimate only.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometricSolver;

impl PoseSolver for GeometricSolver {
    fn solve(
        &self,
        marker: &DetectedMarker,
        entry: &MarkerWorldEntry,
        intrinsics: &CameraIntrinsics,
    ) -> Option<PoseEstimate> {
        solve_geometric(marker, entry, intrinsics)
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

/// Configuration-level strategy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Robust,
    Geometric,
}

impl SolverKind {
    pub fn build(self) -> Box<dyn PoseSolver> {
        match self {
            SolverKind::Robust => Box::new(RobustSolver),
            SolverKind::Geometric => Box::new(GeometricSolver),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    fn intr() -> CameraIntrinsics {
        CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0).unwrap()
    }

    fn entry() -> MarkerWorldEntry {
        MarkerWorldEntry {
            position: Point3::new(0.0, 0.0, 1.5),
            edge_m: 0.15,
        }
    }

    fn centered_square(side: f64) -> DetectedMarker {
        let h = side / 2.0;
        DetectedMarker::new(
            0,
            [
                Point2::new(320.0 - h, 240.0 - h),
                Point2::new(320.0 + h, 240.0 - h),
                Point2::new(320.0 + h, 240.0 + h),
                Point2::new(320.0 - h, 240.0 + h),
            ],
        )
    }

    #[test]
    fn robust_prefers_perspective_confidence() {
        let pose = RobustSolver
            .solve(&centered_square(120.0), &entry(), &intr())
            .unwrap();
        assert_eq!(pose.confidence, crate::PERSPECTIVE_CONFIDENCE);
    }

    #[test]
    fn geometric_strategy_reports_fallback_confidence() {
        let pose = GeometricSolver
            .solve(&centered_square(120.0), &entry(), &intr())
            .unwrap();
        assert_eq!(pose.confidence, crate::GEOMETRIC_CONFIDENCE);
    }

    #[test]
    fn both_strategies_reject_degenerate_quads() {
        let degenerate = centered_square(0.0);
        assert!(RobustSolver.solve(&degenerate, &entry(), &intr()).is_none());
        assert!(GeometricSolver.solve(&degenerate, &entry(), &intr()).is_none());
    }

    #[test]
    fn kind_round_trips_through_serde() {
        let json = serde_json::to_string(&SolverKind::Geometric).unwrap();
        assert_eq!(json, "\"geometric\"");
        let back: SolverKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SolverKind::Geometric);
    }
}

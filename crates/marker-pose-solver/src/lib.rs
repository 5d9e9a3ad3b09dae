//! Single-observation pose solvers for square fiducial markers.
//!
//! Given one detected marker (four image corners), its surveyed world entry
//! and the camera intrinsics, recover a candidate camera pose. Two
//! interchangeable strategies exist behind the [`PoseSolver`] trait:
//!
//! - [`RobustSolver`]: planar perspective solve via homography
//!   decomposition, falling back to the geometric estimate when the solve
//!   is numerically unavailable;
//! - [`GeometricSolver`]: apparent-size range plus principal-point bearing
//!   only, cheaper and less precise.
//!
//! All solve paths return `Option`: an unknown marker or degenerate corner
//! quad yields no candidate, never an error.

mod geometric;
mod homography;
mod perspective;
mod quality;
mod strategy;

pub use geometric::{solve_geometric, GEOMETRIC_CONFIDENCE};
pub use homography::{homography_from_quad, Homography};
pub use perspective::{solve_perspective, PERSPECTIVE_CONFIDENCE};
pub use quality::{quality_score, QualityParams};
pub use strategy::{GeometricSolver, PoseSolver, RobustSolver, SolverKind};

/// World axis convention shared by both solvers.
///
/// Markers hang flat on walls facing the room: marker local x maps to world
/// x, marker local y (up the wall) to world z, and the outward marker normal
/// to world y. The registry models no per-marker rotation; rooms whose
/// markers face different walls need the survey expressed in this frame.
pub(crate) mod frame {
    use nalgebra::Vector3;

    /// Map a displacement from marker-local coordinates to the world frame.
    #[inline]
    pub fn marker_to_world(v: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.x, v.z, v.y)
    }
}

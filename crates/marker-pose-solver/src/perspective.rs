//! Planar perspective pose solve.
//!
//! The marker is a known-size square centered at the origin of its local
//! frame. Its four corners and their normalized image projections give a
//! homography `H ~ [r1 r2 t]`; rescaling the first two columns and
//! re-orthonormalizing recovers the rotation and translation of the marker
//! in camera coordinates, which inverts to the camera pose.

use nalgebra::{Matrix3, Point2};

use marker_pose_core::{CameraIntrinsics, DetectedMarker, MarkerWorldEntry, PoseEstimate};

use crate::frame;
use crate::homography::homography_from_quad;

/// Confidence carried by a successful perspective solve.
pub const PERSPECTIVE_CONFIDENCE: f64 = 0.85;

/// Marker corners in its local plane, meters, matching the detector's
/// TL, TR, BR, BL image order (local x right, y up, z out of the wall).
fn marker_local_corners(edge_m: f64) -> [Point2<f64>; 4] {
    let h = edge_m / 2.0;
    [
        Point2::new(-h, h),
        Point2::new(h, h),
        Point2::new(h, -h),
        Point2::new(-h, -h),
    ]
}

/// Nearest rotation matrix in the Frobenius sense: SVD, then `U * V^T` with
/// a determinant fix to stay in SO(3).
fn project_to_rotation(m: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r = u_flipped * v_t;
    }
    Some(r)
}

/// Recover the camera pose from one marker observation.
///
/// Returns `None` when the corner quad is degenerate or the decomposition is
/// numerically unusable; the caller falls back to the geometric estimate.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip_all, fields(id = marker.id))
)]
pub fn solve_perspective(
    marker: &DetectedMarker,
    entry: &MarkerWorldEntry,
    intrinsics: &CameraIntrinsics,
) -> Option<PoseEstimate> {
    if marker.is_degenerate() {
        return None;
    }

    let image = marker.corners.map(|c| {
        let n = intrinsics.normalize(c);
        Point2::new(n.x, n.y)
    });
    let local = marker_local_corners(entry.edge_m);
    let h = homography_from_quad(&local, &image)?;

    // H ~ [r1 r2 t] up to scale in normalized camera coordinates.
    let a1 = h.h.column(0).into_owned();
    let a2 = h.h.column(1).into_owned();
    let a3 = h.h.column(2).into_owned();

    let n1 = a1.norm();
    let n2 = a2.norm();
    if !(n1.is_finite() && n2.is_finite()) || n1 < 1e-12 || n2 < 1e-12 {
        return None;
    }
    let lambda = 2.0 / (n1 + n2);

    let mut r1 = a1 * lambda;
    let mut r2 = a2 * lambda;
    let mut t = a3 * lambda;

    // The marker must sit in front of the camera (positive depth).
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    if t.z < 1e-9 || !t.iter().all(|v| v.is_finite()) {
        return None;
    }

    let r3 = r1.cross(&r2);
    let r = project_to_rotation(Matrix3::from_columns(&[r1, r2, r3]))?;

    // `r` maps marker coordinates to camera coordinates and `t` is the
    // marker origin in camera space; inverting gives the camera in the
    // marker frame.
    let cam_in_marker = -(r.transpose() * t);
    let position = entry.position + frame::marker_to_world(cam_in_marker);

    // Camera forward axis (camera z) in marker coordinates; heading is its
    // azimuth in the world ground plane.
    let m = r.transpose();
    let forward = m.column(2);
    let heading = forward[2].atan2(forward[0]);

    Some(PoseEstimate::new(position, heading, PERSPECTIVE_CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point2 as P2, Point3, Vector3};
    use std::f64::consts::FRAC_PI_2;

    fn intr() -> CameraIntrinsics {
        CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0).unwrap()
    }

    fn entry() -> MarkerWorldEntry {
        MarkerWorldEntry {
            position: Point3::new(0.0, 0.0, 1.5),
            edge_m: 0.15,
        }
    }

    /// Project the marker as seen by a camera on the marker normal at
    /// distance `d`, upright and centered.
    fn frontal_detection(d: f64) -> DetectedMarker {
        let cam = intr();
        let half = entry().edge_m / 2.0;
        // Marker local (x, y, 0) lands at camera (x, -y, d).
        let project = |x: f64, y: f64| {
            P2::new(
                cam.fx * x / d + cam.cx, //
                cam.fy * (-y) / d + cam.cy,
            )
        };
        DetectedMarker::new(
            0,
            [
                project(-half, half),
                project(half, half),
                project(half, -half),
                project(-half, -half),
            ],
        )
    }

    #[test]
    fn frontal_view_recovers_range_and_height() {
        let pose = solve_perspective(&frontal_detection(0.25), &entry(), &intr()).unwrap();
        assert_relative_eq!(pose.position.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position.y, 0.25, epsilon = 1e-6);
        assert_relative_eq!(pose.position.z, 1.5, epsilon = 1e-6);
        // Camera looks straight at the wall: forward is world -y.
        assert_relative_eq!(pose.heading, -FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(pose.confidence, PERSPECTIVE_CONFIDENCE);
    }

    #[test]
    fn farther_marker_means_farther_camera() {
        let near = solve_perspective(&frontal_detection(0.5), &entry(), &intr()).unwrap();
        let far = solve_perspective(&frontal_detection(1.5), &entry(), &intr()).unwrap();
        assert!(far.position.y > near.position.y);
        assert_relative_eq!(near.position.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(far.position.y, 1.5, epsilon = 1e-6);
    }

    #[test]
    fn offset_marker_shifts_world_position() {
        let mut shifted = entry();
        shifted.position += Vector3::new(2.0, 0.0, -0.5);
        let pose = solve_perspective(&frontal_detection(1.0), &shifted, &intr()).unwrap();
        assert_relative_eq!(pose.position.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_corners_yield_no_candidate() {
        let mut det = frontal_detection(1.0);
        det.corners[1] = det.corners[0];
        assert!(solve_perspective(&det, &entry(), &intr()).is_none());
    }

    #[test]
    fn collinear_corners_yield_no_candidate() {
        let det = DetectedMarker::new(
            0,
            [
                P2::new(100.0, 100.0),
                P2::new(150.0, 100.0),
                P2::new(200.0, 100.0),
                P2::new(250.0, 100.0),
            ],
        );
        assert!(solve_perspective(&det, &entry(), &intr()).is_none());
    }
}

//! Geometric fallback estimation.
//!
//! When the perspective solve is unavailable or numerically unstable, range
//! comes from the pinhole relation between apparent and physical marker
//! size, and bearing from the offset of the marker's image center relative
//! to the principal point. The marker's surveyed height is reused as the
//! camera height; only world x/y are estimated.

use nalgebra::Point3;
use std::f64::consts::PI;

use marker_pose_core::{
    normalize_angle, CameraIntrinsics, DetectedMarker, MarkerWorldEntry, PoseEstimate,
};

/// Confidence carried by a geometric estimate; deliberately lower than the
/// perspective path.
pub const GEOMETRIC_CONFIDENCE: f64 = 0.5;

/// Apparent sides below this (pixels) give no usable range.
const MIN_APPARENT_SIDE_PX: f64 = 1e-6;

#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip_all, fields(id = marker.id))
)]
pub fn solve_geometric(
    marker: &DetectedMarker,
    entry: &MarkerWorldEntry,
    intrinsics: &CameraIntrinsics,
) -> Option<PoseEstimate> {
    if marker.is_degenerate() {
        return None;
    }

    let apparent = marker.mean_side();
    if !(apparent.is_finite() && apparent > MIN_APPARENT_SIDE_PX) {
        return None;
    }

    // Pinhole: apparent_px = fx * edge_m / range.
    let range = intrinsics.fx * entry.edge_m / apparent;

    let center = marker.center();
    let dx = (center.x - intrinsics.cx) / intrinsics.fx;
    let dy = (center.y - intrinsics.cy) / intrinsics.fy;
    let bearing = dy.atan2(dx);

    let position = Point3::new(
        entry.position.x + range * bearing.cos(),
        entry.position.y + range * bearing.sin(),
        entry.position.z,
    );

    // The camera is assumed to face the marker it observes.
    let heading = normalize_angle(bearing + PI);

    Some(PoseEstimate::new(position, heading, GEOMETRIC_CONFIDENCE))
}

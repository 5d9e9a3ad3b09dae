use serde::{Deserialize, Serialize};

use crate::angle::normalize_angle;
use crate::WorldPoint;

/// Camera pose: world position, heading about the vertical axis, and a
/// confidence score.
///
/// Constructed through [`PoseEstimate::new`], which keeps the invariants:
/// heading in `(-PI, PI]`, confidence in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    /// Camera position in the world frame, meters.
    pub position: WorldPoint,
    /// Rotation about the vertical axis, radians in `(-PI, PI]`.
    pub heading: f64,
    /// Trust in the estimate, `[0, 1]`. Not a probability.
    pub confidence: f64,
}

impl PoseEstimate {
    pub fn new(position: WorldPoint, heading: f64, confidence: f64) -> Self {
        Self {
            position,
            heading: normalize_angle(heading),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Euclidean distance to another pose's position, meters.
    pub fn distance_to(&self, other: &PoseEstimate) -> f64 {
        (self.position - other.position).norm()
    }
}

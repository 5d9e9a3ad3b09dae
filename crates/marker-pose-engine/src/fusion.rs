//! Multi-observation fusion.
//!
//! Combines 1..K per-marker pose candidates into one pose. Positions average
//! with confidence-times-quality weights; headings go through the weighted
//! circular mean so the ±PI wrap is handled; fused confidence grows with
//! observation count but stays below a per-count ceiling, always < 1.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use marker_pose_core::{circular_mean, PoseEstimate};

/// One per-marker candidate with its observation quality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseCandidate {
    pub pose: PoseEstimate,
    /// Quality multiplier from the observation scorer, `[0, 1]`.
    pub quality: f64,
}

impl PoseCandidate {
    /// Fusion weight: solver confidence scaled by observation quality.
    fn weight(&self) -> f64 {
        (self.pose.confidence * self.quality).max(0.0)
    }
}

/// Fusion settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FusionParams {
    /// At most this many candidates are fused per frame; extras are
    /// dropped from the end of the list (stable subset, bounded cost).
    pub max_observations: usize,
    /// Confidence ceiling with a single observation (no cross-check).
    pub single_ceiling: f64,
    /// Ceiling with two observations.
    pub dual_ceiling: f64,
    /// Ceiling with three or more observations; always below 1.
    pub multi_ceiling: f64,
    /// Relative confidence boost per observation past the first.
    pub redundancy_boost: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            max_observations: 5,
            single_ceiling: 0.85,
            dual_ceiling: 0.92,
            multi_ceiling: 0.97,
            redundancy_boost: 0.05,
        }
    }
}

impl FusionParams {
    fn ceiling(&self, count: usize) -> f64 {
        match count {
            0 | 1 => self.single_ceiling,
            2 => self.dual_ceiling,
            _ => self.multi_ceiling,
        }
    }
}

/// Fuse candidates into a single pose estimate.
///
/// Returns `None` when no candidate carries positive weight -- "no pose
/// available this frame", not an error.
pub fn fuse(candidates: &[PoseCandidate], params: &FusionParams) -> Option<PoseEstimate> {
    let capped = &candidates[..candidates.len().min(params.max_observations.max(1))];

    let mut sum_w = 0.0;
    let mut sum_pos = Vector3::zeros();
    let mut headings = Vec::with_capacity(capped.len());
    let mut sum_conf_w = 0.0;
    let mut used = 0usize;

    for c in capped {
        let w = c.weight();
        if w <= 0.0 || !w.is_finite() {
            continue;
        }
        sum_w += w;
        sum_pos += c.pose.position.coords * w;
        headings.push((c.pose.heading, w));
        // Per-candidate effective confidence is its weight, so the weighted
        // mean below is sum(w^2)/sum(w).
        sum_conf_w += w * w;
        used += 1;
    }

    if used == 0 || sum_w <= 0.0 {
        return None;
    }

    let position = Point3::from(sum_pos / sum_w);
    let heading = circular_mean(&headings)?;

    let base = sum_conf_w / sum_w;
    let boosted = base * (1.0 + params.redundancy_boost * (used as f64 - 1.0));
    let confidence = boosted.min(params.ceiling(used)).clamp(0.0, 1.0);

    log::trace!("fused {used} candidate(s), confidence {confidence:.3}");
    Some(PoseEstimate::new(position, heading, confidence))
}

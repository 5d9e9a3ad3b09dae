//! Temporal smoothing.
//!
//! Exponential blend between the previous emitted pose and the new fused
//! pose. The blend factor adapts to the elapsed time: quick successive
//! frames keep more of the old pose, long gaps trust the fresh measurement,
//! and anything past the staleness threshold restarts cold. State is a
//! plain value threaded through [`PoseFilter::step`], so the temporal
//! behavior is testable without wall-clock sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use marker_pose_core::{lerp_angle, PoseEstimate};

/// Smoothing settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Gaps longer than this (seconds) restart the filter cold: motion
    /// since the last update is too uncertain to smooth meaningfully.
    pub staleness_s: f64,
    /// Elapsed time (seconds) at which the blend factor would reach 1
    /// before clamping.
    pub time_constant_s: f64,
    /// Lower clamp for the blend factor.
    pub min_alpha: f64,
    /// Upper clamp for the blend factor.
    pub max_alpha: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            staleness_s: 1.0,
            time_constant_s: 0.25,
            min_alpha: 0.15,
            max_alpha: 0.85,
        }
    }
}

/// Filter state: cold (`None`) or tracking with the last emitted pose and
/// its timestamp. Timestamps are relative to an arbitrary session epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothingState {
    last: Option<(PoseEstimate, Duration)>,
}

impl SmoothingState {
    pub fn is_cold(&self) -> bool {
        self.last.is_none()
    }

    pub fn last_pose(&self) -> Option<PoseEstimate> {
        self.last.map(|(p, _)| p)
    }
}

/// Time-adaptive exponential pose filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseFilter {
    params: SmoothingParams,
}

impl PoseFilter {
    pub fn new(params: SmoothingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Blend `pose` against the state, returning the next state and the
    /// pose to emit.
    ///
    /// Cold state and stale state both emit the new pose unchanged; a
    /// timestamp earlier than the stored one is treated as stale (the clock
    /// restarted). Emitted confidence never drops below the previous one.
    pub fn step(
        &self,
        state: SmoothingState,
        pose: PoseEstimate,
        now: Duration,
    ) -> (SmoothingState, PoseEstimate) {
        let Some((prev, at)) = state.last else {
            return (track(pose, now), pose);
        };

        let Some(elapsed) = now.checked_sub(at) else {
            return (track(pose, now), pose);
        };
        let dt = elapsed.as_secs_f64();
        if dt > self.params.staleness_s {
            log::debug!("smoothing state stale after {dt:.3}s, restarting cold");
            return (track(pose, now), pose);
        }

        let alpha = (dt / self.params.time_constant_s)
            .clamp(self.params.min_alpha, self.params.max_alpha);

        let position = prev.position + alpha * (pose.position - prev.position);
        let heading = lerp_angle(prev.heading, pose.heading, alpha);
        let confidence = prev.confidence.max(pose.confidence);

        let emitted = PoseEstimate::new(position, heading, confidence);
        (track(emitted, now), emitted)
    }
}

fn track(pose: PoseEstimate, now: Duration) -> SmoothingState {
    SmoothingState {
        last: Some((pose, now)),
    }
}

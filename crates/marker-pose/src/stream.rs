//! Recorded frame streams.
//!
//! A stream is a JSON array of timestamped detection lists, the shape the
//! CLI consumes and tests replay. Timestamps are seconds from the start of
//! the recording.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use marker_pose_core::{DetectedMarker, MarkerRegistry, PoseEstimate};
use marker_pose_engine::TrackingEngine;

/// One recorded frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Capture time, seconds since the start of the recording.
    pub t_s: f64,
    /// Detections reported for this frame.
    #[serde(default)]
    pub markers: Vec<DetectedMarker>,
}

/// The engine's answer for one frame. `pose` is `null` when the frame
/// produced no estimate (dropped frames never occur during a replay).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseRecord {
    pub t_s: f64,
    pub pose: Option<PoseEstimate>,
}

/// Replay a recording through the engine, one record per frame.
///
/// Frames with a non-finite or negative timestamp are replayed at t = 0.
pub fn run_stream<R: MarkerRegistry>(
    engine: &mut TrackingEngine<R>,
    frames: &[FrameRecord],
) -> Vec<PoseRecord> {
    frames
        .iter()
        .map(|frame| {
            let t = if frame.t_s.is_finite() && frame.t_s >= 0.0 {
                frame.t_s
            } else {
                0.0
            };
            let outcome = engine.process_frame(&frame.markers, Duration::from_secs_f64(t));
            PoseRecord {
                t_s: frame.t_s,
                pose: outcome.pose(),
            }
        })
        .collect()
}

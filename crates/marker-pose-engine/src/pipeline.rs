//! Per-frame pipeline controller.
//!
//! Sequences registry lookup, per-marker solve, quality scoring, fusion and
//! smoothing for one frame at a time. Frames arriving while one is in
//! flight are dropped rather than queued: latency stays bounded under slow
//! processing at the cost of completeness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use marker_pose_core::{
    CameraIntrinsics, ConfigError, DetectedMarker, MarkerRegistry, PoseEstimate,
};
use marker_pose_solver::{quality_score, PoseSolver, QualityParams, SolverKind};

use crate::filter::{PoseFilter, SmoothingParams, SmoothingState};
use crate::fusion::{fuse, FusionParams, PoseCandidate};

/// Errors raised at engine construction. Once built, the engine never
/// fails: all per-frame outcomes are data states.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Full engine configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct EngineParams {
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default)]
    pub quality: QualityParams,
    #[serde(default)]
    pub fusion: FusionParams,
    #[serde(default)]
    pub smoothing: SmoothingParams,
}

/// Result of submitting one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// A previous frame was still being processed; this one was discarded.
    Dropped,
    /// The frame was processed but produced no pose.
    NoPose,
    /// The fused-and-smoothed pose for this frame.
    Pose(PoseEstimate),
}

impl FrameOutcome {
    pub fn pose(self) -> Option<PoseEstimate> {
        match self {
            FrameOutcome::Pose(p) => Some(p),
            _ => None,
        }
    }

    pub fn was_dropped(self) -> bool {
        matches!(self, FrameOutcome::Dropped)
    }
}

/// Releases the in-flight slot exactly once, on every exit path.
struct FrameSlotGuard<'a>(&'a AtomicBool);

impl Drop for FrameSlotGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The tracking engine.
///
/// Registry and intrinsics are fixed for the session and validated at
/// construction. The smoothing state is mutated only by the single active
/// `process_frame` invocation; `reset` takes effect between frames, never
/// mid-frame.
pub struct TrackingEngine<R: MarkerRegistry> {
    registry: R,
    intrinsics: CameraIntrinsics,
    solver: Box<dyn PoseSolver>,
    params: EngineParams,
    filter: PoseFilter,
    state: SmoothingState,
    busy: AtomicBool,
    latest_pose: Option<PoseEstimate>,
    latest_detections: Vec<DetectedMarker>,
}

impl<R: MarkerRegistry> TrackingEngine<R> {
    pub fn new(
        registry: R,
        intrinsics: CameraIntrinsics,
        params: EngineParams,
    ) -> Result<Self, EngineError> {
        intrinsics.validate()?;
        if registry.is_empty() {
            return Err(ConfigError::EmptyRegistry.into());
        }
        let solver = params.solver.build();
        log::debug!(
            "tracking engine ready: {} registered markers, {} solver",
            registry.known_ids().len(),
            solver.name()
        );
        Ok(Self {
            registry,
            intrinsics,
            solver,
            params,
            filter: PoseFilter::new(params.smoothing),
            state: SmoothingState::default(),
            busy: AtomicBool::new(false),
            latest_pose: None,
            latest_detections: Vec::new(),
        })
    }

    /// Process one frame's detections taken at `now` (session-relative).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn process_frame(&mut self, detections: &[DetectedMarker], now: Duration) -> FrameOutcome {
        if self.busy.swap(true, Ordering::AcqRel) {
            log::debug!("frame dropped: previous frame still in flight");
            return FrameOutcome::Dropped;
        }
        let _slot = FrameSlotGuard(&self.busy);

        let mut known = Vec::with_capacity(detections.len());
        for det in detections {
            match self.registry.lookup(det.id) {
                Some(entry) => known.push((*det, *entry)),
                None => log::trace!("marker {}: not in registry, ignored", det.id),
            }
        }

        if known.is_empty() {
            log::debug!("no registered markers in frame");
            self.latest_detections.clear();
            self.latest_pose = None;
            return FrameOutcome::NoPose;
        }
        self.latest_detections = detections.to_vec();

        let cap = self.params.fusion.max_observations.max(1);
        let mut candidates = Vec::with_capacity(known.len().min(cap));
        for (det, entry) in known.iter().take(cap) {
            if let Some(pose) = self.solver.solve(det, entry, &self.intrinsics) {
                candidates.push(PoseCandidate {
                    pose,
                    quality: quality_score(det, &self.params.quality),
                });
            }
        }

        let Some(fused) = fuse(&candidates, &self.params.fusion) else {
            log::debug!("all {} solver calls failed, no pose this frame", known.len());
            self.latest_pose = None;
            return FrameOutcome::NoPose;
        };

        let (state, emitted) = self.filter.step(self.state, fused, now);
        self.state = state;
        self.latest_pose = Some(emitted);
        FrameOutcome::Pose(emitted)
    }

    /// Latest fused-and-smoothed pose, if any.
    pub fn latest_pose(&self) -> Option<PoseEstimate> {
        self.latest_pose
    }

    /// Raw detections from the last processed frame, unknown ids included,
    /// for consumers that render what the detector saw. Empty when the
    /// frame contained no registered marker.
    pub fn latest_detections(&self) -> &[DetectedMarker] {
        &self.latest_detections
    }

    /// Restart tracking: clears the smoothing state and any published pose.
    pub fn reset(&mut self) {
        self.state = SmoothingState::default();
        self.latest_pose = None;
        self.latest_detections.clear();
        log::debug!("tracking reset");
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use marker_pose_core::{MarkerTable, RegisteredMarker};
    use nalgebra::{Point2, Point3};

    fn intr() -> CameraIntrinsics {
        CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0).unwrap()
    }

    fn table() -> MarkerTable {
        MarkerTable::from_markers([RegisteredMarker {
            id: 0,
            position: Point3::new(0.0, 0.0, 1.5),
            edge_m: 0.15,
        }])
        .unwrap()
    }

    fn engine() -> TrackingEngine<MarkerTable> {
        TrackingEngine::new(table(), intr(), EngineParams::default()).unwrap()
    }

    fn centered_square(id: u32, side: f64) -> DetectedMarker {
        let h = side / 2.0;
        DetectedMarker::new(
            id,
            [
                Point2::new(320.0 - h, 240.0 - h),
                Point2::new(320.0 + h, 240.0 - h),
                Point2::new(320.0 + h, 240.0 + h),
                Point2::new(320.0 - h, 240.0 + h),
            ],
        )
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn invalid_intrinsics_fail_construction() {
        let bad = CameraIntrinsics {
            fx: -1.0,
            fy: 600.0,
            cx: 320.0,
            cy: 240.0,
            distortion: None,
        };
        assert!(TrackingEngine::new(table(), bad, EngineParams::default()).is_err());
    }

    #[test]
    fn known_marker_produces_a_pose() {
        let mut eng = engine();
        let out = eng.process_frame(&[centered_square(0, 180.0)], secs(0.0));
        let pose = out.pose().expect("pose");
        assert_relative_eq!(pose.position.z, 1.5, epsilon = 1e-6);
        assert_eq!(eng.latest_pose(), Some(pose));
        assert_eq!(eng.latest_detections().len(), 1);
    }

    #[test]
    fn unknown_marker_yields_no_pose_and_clears_detections() {
        let mut eng = engine();
        eng.process_frame(&[centered_square(0, 180.0)], secs(0.0));
        let out = eng.process_frame(&[centered_square(99, 180.0)], secs(0.1));
        assert_eq!(out, FrameOutcome::NoPose);
        assert!(eng.latest_pose().is_none());
        assert!(eng.latest_detections().is_empty());
    }

    #[test]
    fn unknown_ids_stay_visible_next_to_registry_hits() {
        let mut eng = engine();
        let out = eng.process_frame(
            &[centered_square(0, 180.0), centered_square(99, 90.0)],
            secs(0.0),
        );
        assert!(out.pose().is_some());
        // The stored list is the raw frame, not the registry-filtered one.
        assert_eq!(eng.latest_detections().len(), 2);
        assert_eq!(eng.latest_detections()[1].id, 99);
    }

    #[test]
    fn degenerate_detection_yields_no_pose_not_an_error() {
        let mut eng = engine();
        let out = eng.process_frame(&[centered_square(0, 0.0)], secs(0.0));
        assert_eq!(out, FrameOutcome::NoPose);
    }

    #[test]
    fn busy_slot_drops_the_frame_and_is_released() {
        let mut eng = engine();
        eng.busy.store(true, Ordering::Release);
        let out = eng.process_frame(&[centered_square(0, 180.0)], secs(0.0));
        assert!(out.was_dropped());

        // The drop path must not have consumed the release guard early;
        // clearing the flag lets the next frame through.
        eng.busy.store(false, Ordering::Release);
        assert!(eng
            .process_frame(&[centered_square(0, 180.0)], secs(0.1))
            .pose()
            .is_some());
        // And the slot is free again afterwards.
        assert!(!eng.busy.load(Ordering::Acquire));
    }

    #[test]
    fn reset_returns_to_cold() {
        let mut eng = engine();
        eng.process_frame(&[centered_square(0, 180.0)], secs(0.0));
        assert!(eng.latest_pose().is_some());
        eng.reset();
        assert!(eng.latest_pose().is_none());
        assert!(eng.latest_detections().is_empty());

        // First frame after reset is emitted unsmoothed.
        let out = eng.process_frame(&[centered_square(0, 180.0)], secs(5.0));
        assert!(out.pose().is_some());
    }

    #[test]
    fn successive_frames_are_smoothed() {
        let mut eng = engine();
        let first = eng
            .process_frame(&[centered_square(0, 180.0)], secs(0.0))
            .pose()
            .unwrap();
        let second = eng
            .process_frame(&[centered_square(0, 90.0)], secs(0.1))
            .pose()
            .unwrap();
        // The camera moved back (smaller marker); the smoothed estimate
        // lies strictly between the two raw distances.
        assert!(second.position.y > first.position.y);
        let raw_far = 600.0 * 0.15 / 90.0;
        assert!(second.position.y < raw_far);
    }
}

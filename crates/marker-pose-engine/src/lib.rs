//! Frame-level pose estimation: fusion of per-marker candidates, temporal
//! smoothing and the one-frame-at-a-time pipeline controller.
//!
//! The engine sits downstream of marker detection and upstream of display.
//! Per frame: registry lookup, per-marker solve, quality weighting, fusion,
//! smoothing. Every empty outcome is an `Option`, never an error; the only
//! fallible operation is construction, which validates the configuration.

mod filter;
mod fusion;
mod pipeline;

pub use filter::{PoseFilter, SmoothingParams, SmoothingState};
pub use fusion::{fuse, FusionParams, PoseCandidate};
pub use pipeline::{EngineError, EngineParams, FrameOutcome, TrackingEngine};

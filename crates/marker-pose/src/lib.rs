//! High-level facade crate for the `marker-pose-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying engine crates
//! - a small frame-stream layer for replaying recorded detections
//! - (feature-gated) a CLI binary that runs the full pipeline over JSON
//!   survey/intrinsics/frame files.
//!
//! ## Quickstart
//!
//! ```
//! use std::time::Duration;
//! use marker_pose::core::{CameraIntrinsics, DetectedMarker, MarkerTable, RegisteredMarker};
//! use marker_pose::engine::{EngineParams, TrackingEngine};
//! use nalgebra::{Point2, Point3};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = MarkerTable::from_markers([RegisteredMarker {
//!     id: 0,
//!     position: Point3::new(0.0, 0.0, 1.5),
//!     edge_m: 0.15,
//! }])?;
//! let intrinsics = CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0)?;
//! let mut engine = TrackingEngine::new(registry, intrinsics, EngineParams::default())?;
//!
//! let marker = DetectedMarker::new(0, [
//!     Point2::new(230.0, 150.0),
//!     Point2::new(410.0, 150.0),
//!     Point2::new(410.0, 330.0),
//!     Point2::new(230.0, 330.0),
//! ]);
//! let outcome = engine.process_frame(&[marker], Duration::ZERO);
//! println!("pose: {:?}", outcome.pose());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`core`]: geometry, registry, intrinsics, angle math, logging.
//! - [`solver`]: single-marker pose solvers and quality scoring.
//! - [`engine`]: fusion, temporal smoothing, the frame pipeline.
//! - [`stream`]: serde types and a runner for recorded frame streams.

pub use marker_pose_core as core;
pub use marker_pose_engine as engine;
pub use marker_pose_solver as solver;

pub use marker_pose_core::{CameraIntrinsics, DetectedMarker, MarkerTable, PoseEstimate};
pub use marker_pose_engine::{EngineParams, FrameOutcome, TrackingEngine};

pub mod stream;

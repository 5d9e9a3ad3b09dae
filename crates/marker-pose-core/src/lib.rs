//! Core types and utilities for marker-based camera pose estimation.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete marker detector or image type: detections arrive
//! as identifiers plus image-plane corner quads, produced elsewhere.

mod angle;
mod error;
mod intrinsics;
mod logger;
mod marker;
mod pose;
mod registry;

pub use angle::{angle_diff, circular_mean, lerp_angle, normalize_angle};
pub use error::ConfigError;
pub use intrinsics::CameraIntrinsics;
pub use marker::DetectedMarker;
pub use pose::PoseEstimate;
pub use registry::{MarkerRegistry, MarkerTable, MarkerWorldEntry, RegisteredMarker};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};

/// A point on the image plane, in pixels.
pub type ImagePoint = nalgebra::Point2<f64>;

/// A point in the world frame, in meters.
pub type WorldPoint = nalgebra::Point3<f64>;

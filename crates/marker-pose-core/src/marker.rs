use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::ImagePoint;

/// Two corners closer than this (pixels) count as coincident.
const DISTINCT_CORNER_EPS: f64 = 1e-6;

/// One marker observation in a single frame.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left as
/// seen in the image, i.e. a consistent clockwise winding in pixel
/// coordinates (y down). The detector guarantees the order; a mis-ordered
/// quad produces a meaningless pose, not an error.
///
/// Observations carry no identity across frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    /// Decoded marker identifier.
    pub id: u32,
    /// Image-plane corner quad, pixels.
    pub corners: [ImagePoint; 4],
}

impl DetectedMarker {
    pub fn new(id: u32, corners: [ImagePoint; 4]) -> Self {
        Self { id, corners }
    }

    /// Mean of the four corners.
    pub fn center(&self) -> ImagePoint {
        let mut x = 0.0;
        let mut y = 0.0;
        for c in &self.corners {
            x += c.x;
            y += c.y;
        }
        Point2::new(x / 4.0, y / 4.0)
    }

    /// Side lengths in corner order (TL-TR, TR-BR, BR-BL, BL-TL), pixels.
    pub fn side_lengths(&self) -> [f64; 4] {
        let c = &self.corners;
        [
            (c[1] - c[0]).norm(),
            (c[2] - c[1]).norm(),
            (c[3] - c[2]).norm(),
            (c[0] - c[3]).norm(),
        ]
    }

    /// Mean side length, pixels.
    pub fn mean_side(&self) -> f64 {
        self.side_lengths().iter().sum::<f64>() / 4.0
    }

    /// Axis-aligned bounding-box area of the corner quad, square pixels.
    pub fn bounding_area(&self) -> f64 {
        let xs = self.corners.map(|c| c.x);
        let ys = self.corners.map(|c| c.y);
        let w = xs.iter().fold(f64::MIN, |a, &b| a.max(b))
            - xs.iter().fold(f64::MAX, |a, &b| a.min(b));
        let h = ys.iter().fold(f64::MIN, |a, &b| a.max(b))
            - ys.iter().fold(f64::MAX, |a, &b| a.min(b));
        w * h
    }

    /// A quad is degenerate when any corner is non-finite, two corners
    /// coincide, or the apparent size vanishes. Degenerate quads yield no
    /// pose candidate; they are a normal data state, not a fault.
    pub fn is_degenerate(&self) -> bool {
        for c in &self.corners {
            if !(c.x.is_finite() && c.y.is_finite()) {
                return true;
            }
        }
        for i in 0..4 {
            for j in (i + 1)..4 {
                if (self.corners[i] - self.corners[j]).norm() < DISTINCT_CORNER_EPS {
                    return true;
                }
            }
        }
        self.bounding_area() < DISTINCT_CORNER_EPS
    }
}

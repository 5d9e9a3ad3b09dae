use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ImagePoint;

/// Undistortion fixed-point iterations; plenty for typical webcam lenses.
const UNDISTORT_ITERS: usize = 5;

/// Pinhole camera intrinsics with optional Brown-Conrady distortion.
///
/// Set once at startup and read-only afterwards; safe to share across
/// threads without synchronization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length along image x, pixels.
    pub fx: f64,
    /// Focal length along image y, pixels.
    pub fy: f64,
    /// Principal point x, pixels.
    pub cx: f64,
    /// Principal point y, pixels.
    pub cy: f64,
    /// Optional distortion coefficients `[k1, k2, p1, p2, k3]`.
    #[serde(default)]
    pub distortion: Option<[f64; 5]>,
}

impl CameraIntrinsics {
    /// Distortion-free intrinsics, validated.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, ConfigError> {
        let intr = Self {
            fx,
            fy,
            cx,
            cy,
            distortion: None,
        };
        intr.validate()?;
        Ok(intr)
    }

    /// Reject non-physical parameters. Called again by the engine at
    /// construction so deserialized configs cannot skip the check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fx.is_finite() && self.fy.is_finite()) || self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(ConfigError::InvalidFocalLength {
                fx: self.fx,
                fy: self.fy,
            });
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(ConfigError::InvalidPrincipalPoint {
                cx: self.cx,
                cy: self.cy,
            });
        }
        Ok(())
    }

    /// Calibration matrix `K`.
    pub fn k_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Map a pixel to ideal normalized image coordinates (z = 1 plane),
    /// removing lens distortion when coefficients are present.
    pub fn normalize(&self, p: ImagePoint) -> Point2<f64> {
        let xd = (p.x - self.cx) / self.fx;
        let yd = (p.y - self.cy) / self.fy;
        match self.distortion {
            None => Point2::new(xd, yd),
            Some(coeffs) => undistort_normalized(xd, yd, &coeffs),
        }
    }
}

/// Invert the Brown-Conrady model by fixed-point iteration: start at the
/// distorted coordinates and repeatedly divide out the radial factor.
fn undistort_normalized(xd: f64, yd: f64, c: &[f64; 5]) -> Point2<f64> {
    let [k1, k2, p1, p2, k3] = *c;
    let mut x = xd;
    let mut y = yd;
    for _ in 0..UNDISTORT_ITERS {
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (k1 + r2 * (k2 + r2 * k3));
        let dx = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
        let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
        if radial.abs() < f64::EPSILON {
            break;
        }
        x = (xd - dx) / radial;
        y = (yd - dy) / radial;
    }
    Point2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn intr() -> CameraIntrinsics {
        CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0).unwrap()
    }

    #[test]
    fn rejects_bad_focal_lengths() {
        assert!(CameraIntrinsics::new(0.0, 600.0, 320.0, 240.0).is_err());
        assert!(CameraIntrinsics::new(600.0, -1.0, 320.0, 240.0).is_err());
        assert!(CameraIntrinsics::new(f64::NAN, 600.0, 320.0, 240.0).is_err());
    }

    #[test]
    fn rejects_non_finite_principal_point() {
        assert!(CameraIntrinsics::new(600.0, 600.0, f64::INFINITY, 240.0).is_err());
    }

    #[test]
    fn principal_point_normalizes_to_origin() {
        let n = intr().normalize(Point2::new(320.0, 240.0));
        assert_relative_eq!(n.x, 0.0);
        assert_relative_eq!(n.y, 0.0);
    }

    #[test]
    fn normalization_scales_by_focal_length() {
        let n = intr().normalize(Point2::new(320.0 + 60.0, 240.0 - 30.0));
        assert_relative_eq!(n.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(n.y, -0.05, epsilon = 1e-12);
    }

    #[test]
    fn undistortion_inverts_forward_model() {
        let coeffs = [-0.2, 0.05, 0.0005, -0.0003, 0.0];
        let mut cam = intr();
        cam.distortion = Some(coeffs);

        // Forward-distort an ideal point, then undo it through normalize().
        let (x, y) = (0.15, -0.08);
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (coeffs[0] + r2 * (coeffs[1] + r2 * coeffs[4]));
        let xd = x * radial + 2.0 * coeffs[2] * x * y + coeffs[3] * (r2 + 2.0 * x * x);
        let yd = y * radial + coeffs[2] * (r2 + 2.0 * y * y) + 2.0 * coeffs[3] * x * y;
        let px = Point2::new(xd * cam.fx + cam.cx, yd * cam.fy + cam.cy);

        let n = cam.normalize(px);
        assert_relative_eq!(n.x, x, epsilon = 1e-6);
        assert_relative_eq!(n.y, y, epsilon = 1e-6);
    }
}

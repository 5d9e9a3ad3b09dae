//! Angle arithmetic on the circle.
//!
//! Headings live in `(-PI, PI]`. Averaging and interpolation must go through
//! unit vectors or shortest signed differences; plain arithmetic on the raw
//! radians breaks at the wrap boundary.

use std::f64::consts::PI;

/// Resultant length (relative to total weight) below which a weighted vector
/// sum of headings is considered degenerate.
const RESULTANT_EPS: f64 = 1e-9;

/// Wrap an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle.rem_euclid(2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Shortest signed difference `b - a`, in `(-PI, PI]`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    normalize_angle(b - a)
}

/// Interpolate from `a` towards `b` along the shorter arc.
///
/// `t = 0` yields `a`, `t = 1` yields `b`. The result is normalized, so the
/// interpolation never overshoots across the wrap boundary.
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    normalize_angle(a + t * angle_diff(a, b))
}

/// Weighted circular mean of `(heading, weight)` samples.
///
/// Each heading is mapped to a unit vector, the weighted vector sum is taken
/// and the mean is the direction of the resultant. Samples with non-positive
/// weight are skipped. Returns `None` when no usable sample remains.
///
/// When the resultant cancels to (numerically) zero -- opposite headings with
/// equal weight -- the mean is undefined; the wrap boundary `PI` is reported
/// so the degenerate case stays visible instead of collapsing to zero.
pub fn circular_mean(samples: &[(f64, f64)]) -> Option<f64> {
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut total = 0.0;
    for &(heading, weight) in samples {
        if weight <= 0.0 || !weight.is_finite() {
            continue;
        }
        sx += weight * heading.cos();
        sy += weight * heading.sin();
        total += weight;
    }
    if total <= 0.0 {
        return None;
    }
    if sx.hypot(sy) < RESULTANT_EPS * total {
        return Some(PI);
    }
    Some(sy.atan2(sx))
}

//! Four-point homography estimation.
//!
//! The solvers only ever see one planar square at a time, so the minimal
//! four-correspondence case is all that is needed. Hartley normalization
//! keeps the 8x8 system well conditioned for pixel-scale inputs.

use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn normalizing_transform(pts: &[Point2<f64>; 4]) -> Matrix3<f64> {
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= 4.0;
    cy /= 4.0;

    let mut mean_dist = 0.0;
    for p in pts {
        mean_dist += (p.x - cx).hypot(p.y - cy);
    }
    mean_dist /= 4.0;

    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn apply_transform(t: &Matrix3<f64>, pts: &[Point2<f64>; 4]) -> [Point2<f64>; 4] {
    pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    })
}

fn rescale(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Compute H such that `dst ~ H * src`, from 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (e.g. near-collinear corners), which the
/// caller treats as "no candidate", not an error.
pub fn homography_from_quad(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Option<Homography> {
    // Unknowns [h11 .. h32] with h33 = 1. Each correspondence (x,y)->(u,v):
    //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
    //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let t_src = normalizing_transform(src);
    let t_dst = normalizing_transform(dst);
    let src_n = apply_transform(&t_src, src);
    let dst_n = apply_transform(&t_dst, dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // Denormalize: H = T_dst^{-1} * Hn * T_src.
    let h = t_dst.try_inverse()? * hn * t_src;
    rescale(h).map(Homography::new)
}

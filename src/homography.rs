//! Perspective transformation between the base rectangle and the corners
//!
//! This module derives the homography that maps the base rectangle onto
//! the user-edited quadrilateral. The 3x3 projective matrix is embedded in
//! a 4x4 matrix so it can be multiplied straight into a 3D transform stack.

use nalgebra::{Matrix4, SMatrix, SVector, Vector4};
use serde::Serialize;

use crate::error::WarpError;
use crate::geometry::{Corner, Corners, Point, Rect};

/// Relative pivot size below which the linear system counts as singular
const PIVOT_EPSILON: f64 = 1e-12;

/// Relative sine of the angle under which three corners count as collinear
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Homogeneous w magnitude under which a mapped point is at infinity
const W_EPSILON: f64 = 1e-12;

/// Projective warp matrix (3x3 homography embedded as 4x4)
///
/// Only ever built from an invertible matrix, so the inverse used for
/// reverse mapping is computed once and kept alongside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpMatrix {
    forward: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl Default for WarpMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl WarpMatrix {
    pub fn identity() -> Self {
        Self {
            forward: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// Wrap a 4x4 matrix, failing if it has no inverse
    pub fn try_new(forward: Matrix4<f64>) -> Result<Self, WarpError> {
        let inverse = forward.try_inverse().ok_or(WarpError::SingularMatrix)?;
        Ok(Self { forward, inverse })
    }

    /// Embed a row-major 3x3 homography into the 4x4 layout
    pub fn from_homography(h: &[f64; 9]) -> Result<Self, WarpError> {
        #[rustfmt::skip]
        let forward = Matrix4::new(
            h[0], h[1], 0.0, h[2],
            h[3], h[4], 0.0, h[5],
            0.0,  0.0,  1.0, 0.0,
            h[6], h[7], 0.0, h[8],
        );
        Self::try_new(forward)
    }

    pub fn forward(&self) -> &Matrix4<f64> {
        &self.forward
    }

    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.inverse
    }

    /// Column-major element order, as GL-style transform stacks expect
    pub fn to_column_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.forward.as_slice());
        out
    }

    /// Rows of the forward matrix, for display and serialization
    pub fn rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.forward[(r, c)];
            }
        }
        rows
    }

    /// Transform a point with the forward matrix
    #[inline]
    pub fn transform_point(&self, p: Point) -> Result<Point, WarpError> {
        apply_projective(&self.forward, p)
    }

    /// Transform a point with the inverse matrix
    #[inline]
    pub fn inverse_transform_point(&self, p: Point) -> Result<Point, WarpError> {
        apply_projective(&self.inverse, p)
    }
}

impl Serialize for WarpMatrix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

/// Derive the warp that maps `base` (relative to its own origin) onto `corners`
///
/// The base rectangle's corners (0,0), (w,0), (w,h), (0,h) correspond, in
/// order, to the top-left, top-right, bottom-right and bottom-left corners.
pub fn compute_warp(base: &Rect, corners: &Corners) -> Result<WarpMatrix, WarpError> {
    if base.width.abs() < f64::EPSILON || base.height.abs() < f64::EPSILON {
        return Err(WarpError::DegenerateRectangle {
            width: base.width,
            height: base.height,
        });
    }
    check_collinear(corners)?;

    let h = compute_homography(base.local_corners(), *corners.points())?;
    WarpMatrix::from_homography(&h)
}

/// Reject quadrilaterals where any three corners share a line
fn check_collinear(corners: &Corners) -> Result<(), WarpError> {
    const TRIPLES: [[Corner; 3]; 4] = [
        [Corner::TopLeft, Corner::TopRight, Corner::BottomRight],
        [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft],
        [Corner::TopLeft, Corner::BottomRight, Corner::BottomLeft],
        [Corner::TopRight, Corner::BottomRight, Corner::BottomLeft],
    ];

    for [a, b, c] in TRIPLES {
        let ab = corners[b] - corners[a];
        let ac = corners[c] - corners[a];
        if ab.cross(ac).abs() <= COLLINEAR_EPSILON * ab.length() * ac.length() {
            return Err(WarpError::CollinearCorners(a.as_str(), b.as_str(), c.as_str()));
        }
    }
    Ok(())
}

/// Compute a row-major 3x3 homography from 4 point correspondences
fn compute_homography(src: [Point; 4], dst: [Point; 4]) -> Result<[f64; 9], WarpError> {
    // Each correspondence (x,y) -> (x',y') gives two equations in h1..h8
    // with h9 fixed to 1:
    //   x*h1 + y*h2 + h3 - x'*x*h7 - x'*y*h8 = x'
    //   x*h4 + y*h5 + h6 - y'*x*h7 - y'*y*h8 = y'
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s.x, s.y);
        let (xp, yp) = (d.x, d.y);

        a.row_mut(i * 2)
            .copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -xp * x, -xp * y]);
        b[i * 2] = xp;

        a.row_mut(i * 2 + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -yp * x, -yp * y]);
        b[i * 2 + 1] = yp;
    }

    let h = solve_linear_system(a, &b)?;

    Ok([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0])
}

/// Solve an 8x8 linear system by LU decomposition with partial pivoting
///
/// Pivots smaller than `PIVOT_EPSILON` times the largest entry count as
/// zero, so nearly singular systems are rejected instead of blowing up.
fn solve_linear_system(
    a: SMatrix<f64, 8, 8>,
    b: &SVector<f64, 8>,
) -> Result<SVector<f64, 8>, WarpError> {
    let scale = a.amax();
    if scale == 0.0 || !scale.is_finite() {
        return Err(WarpError::SingularSystem);
    }

    let lu = a.lu();
    if lu
        .u()
        .diagonal()
        .iter()
        .any(|pivot| pivot.abs() <= PIVOT_EPSILON * scale)
    {
        return Err(WarpError::SingularSystem);
    }

    let x = lu.solve(b).ok_or(WarpError::SingularSystem)?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(WarpError::SingularSystem);
    }
    Ok(x)
}

/// Multiply (x, y, 0, 1) by `m` and normalize by the resulting w
#[inline]
fn apply_projective(m: &Matrix4<f64>, p: Point) -> Result<Point, WarpError> {
    let v = m * Vector4::new(p.x, p.y, 0.0, 1.0);
    let w = v[3];
    if w.abs() < W_EPSILON || !w.is_finite() {
        return Err(WarpError::PointAtInfinity { x: p.x, y: p.y });
    }
    Ok(Point::new(v[0] / w, v[1] / w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "{} != {}",
            a,
            b
        );
    }

    fn skewed() -> Corners {
        Corners([
            Point::new(12.0, 8.0),
            Point::new(410.0, -20.0),
            Point::new(380.0, 290.0),
            Point::new(-15.0, 260.0),
        ])
    }

    #[test]
    fn test_identity_transform() {
        let base = Rect::from_size(100.0, 100.0);
        let warp = compute_warp(&base, &Corners::from_rect(&base)).unwrap();

        for p in [
            Point::new(50.0, 50.0),
            Point::new(0.0, 0.0),
            Point::new(-30.0, 175.5),
        ] {
            assert_close(warp.transform_point(p).unwrap(), p);
            assert_close(warp.inverse_transform_point(p).unwrap(), p);
        }
    }

    #[test]
    fn test_corner_correspondence() {
        let base = Rect::from_size(400.0, 300.0);
        let corners = skewed();
        let warp = compute_warp(&base, &corners).unwrap();

        for (src, dst) in base.local_corners().iter().zip(corners.points()) {
            assert_close(warp.transform_point(*src).unwrap(), *dst);
        }
    }

    #[test]
    fn test_round_trip() {
        let base = Rect::from_size(400.0, 300.0);
        let warp = compute_warp(&base, &skewed()).unwrap();

        for p in [
            Point::new(200.0, 150.0),
            Point::new(1.0, 299.0),
            Point::new(333.3, 12.7),
        ] {
            let warped = warp.transform_point(p).unwrap();
            assert_close(warp.inverse_transform_point(warped).unwrap(), p);
        }
    }

    #[test]
    fn test_perspective_midpoint() {
        // Trapezoid narrowing at the top: the rectangle's center lands on the
        // quad's diagonal intersection, above its vertical midpoint
        let base = Rect::from_size(100.0, 100.0);
        let corners = Corners([
            Point::new(25.0, 0.0),
            Point::new(75.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let warp = compute_warp(&base, &corners).unwrap();
        let center = warp.transform_point(Point::new(50.0, 50.0)).unwrap();
        assert!((center.x - 50.0).abs() < 1e-9);
        assert!((center.y - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_rectangle() {
        let corners = Corners::from_rect(&Rect::from_size(100.0, 100.0));
        assert!(matches!(
            compute_warp(&Rect::from_size(0.0, 100.0), &corners),
            Err(WarpError::DegenerateRectangle { .. })
        ));
        assert!(matches!(
            compute_warp(&Rect::from_size(100.0, 0.0), &corners),
            Err(WarpError::DegenerateRectangle { .. })
        ));
    }

    #[test]
    fn test_collinear_corners() {
        let base = Rect::from_size(100.0, 100.0);
        let line = Corners([
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(30.0, 30.0),
        ]);
        assert!(matches!(
            compute_warp(&base, &line),
            Err(WarpError::CollinearCorners(..))
        ));

        // Bottom-right pulled onto the line from top-right to bottom-left
        let mut corners = Corners::from_rect(&base);
        corners[Corner::BottomRight] = Point::new(50.0, 50.0);
        assert_eq!(
            compute_warp(&base, &corners),
            Err(WarpError::CollinearCorners(
                "top-right",
                "bottom-right",
                "bottom-left"
            ))
        );
    }

    #[test]
    fn test_coincident_corners() {
        let base = Rect::from_size(100.0, 100.0);
        let mut corners = Corners::from_rect(&base);
        corners[Corner::TopRight] = corners[Corner::TopLeft];
        assert!(compute_warp(&base, &corners).is_err());
    }

    #[test]
    fn test_point_at_infinity() {
        let base = Rect::from_size(100.0, 100.0);
        let corners = Corners([
            Point::new(40.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let warp = compute_warp(&base, &corners).unwrap();
        // w = h7 * y + 1 vanishes on this horizontal line of the base space
        let h = warp.forward();
        let y_vanish = -h[(3, 3)] / h[(3, 1)];
        assert!(warp.transform_point(Point::new(0.0, y_vanish)).is_err());
    }

    #[test]
    fn test_singular_matrix_rejected() {
        assert_eq!(
            WarpMatrix::try_new(Matrix4::zeros()),
            Err(WarpError::SingularMatrix)
        );
    }

    #[test]
    fn test_solve_linear_system() {
        let a = SMatrix::<f64, 8, 8>::from_diagonal_element(2.0);
        let b = SVector::<f64, 8>::from_fn(|i, _| i as f64);
        let x = solve_linear_system(a, &b).unwrap();
        for i in 0..8 {
            assert!((x[i] - i as f64 / 2.0).abs() < 1e-12);
        }

        let mut tiny = a;
        tiny[(5, 5)] = 1e-13;
        assert_eq!(
            solve_linear_system(tiny, &b),
            Err(WarpError::SingularSystem)
        );
        assert_eq!(
            solve_linear_system(SMatrix::zeros(), &b),
            Err(WarpError::SingularSystem)
        );
    }

    #[test]
    fn test_column_major_layout() {
        let base = Rect::from_size(400.0, 300.0);
        let warp = compute_warp(&base, &skewed()).unwrap();
        let cm = warp.to_column_major();
        let rows = warp.rows();
        // Translation x lives in column 3, row 0
        assert_eq!(cm[12], rows[0][3]);
        assert_eq!(cm[3], rows[3][0]);
        assert_eq!(rows[3][3], 1.0);
    }
}

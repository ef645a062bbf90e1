//! Conversions between screen space and warped space
//!
//! The forward warp operates relative to the base rectangle's origin, so
//! screen points are shifted by (-x, -y) before the forward matrix is
//! applied, and shifted back after the inverse.

use crate::error::WarpError;
use crate::geometry::{Point, Rect};
use crate::homography::WarpMatrix;

/// Map a screen point to where the warp places it
pub fn to_warped_space(p: Point, matrix: &WarpMatrix, base: &Rect) -> Result<Point, WarpError> {
    matrix.transform_point(p - base.origin())
}

/// Map a point in warped space back to the screen point it came from
pub fn to_screen_space(p: Point, matrix: &WarpMatrix, base: &Rect) -> Result<Point, WarpError> {
    Ok(matrix.inverse_transform_point(p)? + base.origin())
}

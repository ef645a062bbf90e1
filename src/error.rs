//! Error types for warp computation and persisted state

use thiserror::Error;

/// Errors produced while deriving or applying a warp, or restoring saved state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WarpError {
    /// The base rectangle has no area
    #[error("base rectangle {width}x{height} has zero area")]
    DegenerateRectangle { width: f64, height: f64 },

    /// Three of the four destination corners lie on one line
    #[error("corners {0}, {1} and {2} are collinear")]
    CollinearCorners(&'static str, &'static str, &'static str),

    /// The LU decomposition hit a vanishing pivot
    #[error("homography system is singular")]
    SingularSystem,

    /// The warp matrix cannot be inverted
    #[error("warp matrix is not invertible")]
    SingularMatrix,

    /// The homogeneous w component vanished, so the point maps to infinity
    #[error("point ({x}, {y}) maps to infinity")]
    PointAtInfinity { x: f64, y: f64 },

    /// The named group is missing from the document
    #[error("no \"{0}\" group found")]
    MissingGroup(String),

    /// The group holds fewer than four corner entries
    #[error("less than 4 \"corner\" entries found ({0})")]
    TooFewCorners(usize),

    /// The group exists but cannot be decoded
    #[error("malformed warper record: {0}")]
    MalformedRecord(String),
}

//! quadwarp - interactive four-corner perspective warping
//!
//! A [`Warper`] maps a rectangular base coordinate space onto an editable
//! quadrilateral through a projective transform, for projection mapping
//! onto surfaces that aren't rectangular. Corners can be dragged, nudged
//! with arrow keys or moved together, and the transform follows every edit.

pub mod config;
pub mod error;
pub mod geometry;
pub mod homography;
pub mod host;
pub mod interaction;
pub mod mapper;
pub mod render;
pub mod snapshot;
pub mod warper;

pub use error::WarpError;
pub use geometry::{Corner, Corners, Point, Rect};
pub use homography::{compute_warp, WarpMatrix};
pub use host::{HeadlessHost, HostPort, InputChannel};
pub use interaction::{InteractionState, Key, PointerEvent};
pub use render::{DrawSettings, RenderContext};
pub use snapshot::StateSnapshot;
pub use warper::Warper;

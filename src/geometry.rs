//! Points, the base rectangle and the four-corner set
//!
//! The corner set is a fixed array indexed by [`Corner`]. Its order
//! (top-left, top-right, bottom-right, bottom-left) matches the order in
//! which the base rectangle's corners are enumerated when the homography
//! is derived, so it must never be rearranged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub};
use std::str::FromStr;

/// A 2D point in screen or warp coordinates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Z component of the cross product of two vectors
    pub fn cross(&self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The rectangle defining the source coordinate space of the warp
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Length of the diagonal, used to scale corner selection
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// The four extremes in absolute coordinates, in corner order
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x, self.y + self.height),
        ]
    }

    /// The four extremes relative to the origin: (0,0), (w,0), (w,h), (0,h)
    pub fn local_corners(&self) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(self.width, self.height),
            Point::new(0.0, self.height),
        ]
    }
}

/// One of the four corners of the warped quadrilateral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in canonical order
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Corner> {
        Corner::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tl" | "top-left" | "topleft" => Ok(Corner::TopLeft),
            "tr" | "top-right" | "topright" => Ok(Corner::TopRight),
            "br" | "bottom-right" | "bottomright" => Ok(Corner::BottomRight),
            "bl" | "bottom-left" | "bottomleft" => Ok(Corner::BottomLeft),
            other => Err(format!("unknown corner '{}'", other)),
        }
    }
}

/// The four destination points of the warp
///
/// No convexity or winding is enforced. The same points double as the
/// hit polygon, so the polygon can never fall out of sync with the corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners(pub [Point; 4]);

impl Corners {
    /// Corners sitting on the extremes of a rectangle
    pub fn from_rect(rect: &Rect) -> Self {
        Self(rect.corners())
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Point::is_finite)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Corner, Point)> + '_ {
        Corner::ALL.into_iter().map(move |c| (c, self.0[c.index()]))
    }

    /// Translate every corner by the same offset
    pub fn translate(&mut self, by: Point) {
        for p in self.0.iter_mut() {
            *p += by;
        }
    }

    /// Even-odd point-in-polygon test over the closed quadrilateral
    pub fn contains(&self, p: Point) -> bool {
        let pts = &self.0;
        let mut inside = false;
        let mut j = pts.len() - 1;
        for i in 0..pts.len() {
            let (a, b) = (pts[i], pts[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

impl Index<Corner> for Corners {
    type Output = Point;

    fn index(&self, corner: Corner) -> &Point {
        &self.0[corner.index()]
    }
}

impl IndexMut<Corner> for Corners {
    fn index_mut(&mut self, corner: Corner) -> &mut Point {
        &mut self.0[corner.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_corner_order() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        let corners = Corners::from_rect(&rect);
        assert_eq!(corners[Corner::TopLeft], Point::new(10.0, 20.0));
        assert_eq!(corners[Corner::TopRight], Point::new(110.0, 20.0));
        assert_eq!(corners[Corner::BottomRight], Point::new(110.0, 70.0));
        assert_eq!(corners[Corner::BottomLeft], Point::new(10.0, 70.0));
        assert_eq!(rect.local_corners()[2], Point::new(100.0, 50.0));
    }

    #[test]
    fn test_diagonal() {
        assert_eq!(Rect::from_size(3.0, 4.0).diagonal(), 5.0);
    }

    #[test]
    fn test_translate() {
        let mut corners = Corners::from_rect(&Rect::from_size(10.0, 10.0));
        corners.translate(Point::new(2.0, -3.0));
        assert_eq!(corners[Corner::TopLeft], Point::new(2.0, -3.0));
        assert_eq!(corners[Corner::BottomRight], Point::new(12.0, 7.0));
    }

    #[test]
    fn test_contains() {
        let corners = Corners([
            Point::new(0.0, 0.0),
            Point::new(100.0, 10.0),
            Point::new(90.0, 100.0),
            Point::new(5.0, 80.0),
        ]);
        assert!(corners.contains(Point::new(50.0, 50.0)));
        assert!(!corners.contains(Point::new(95.0, 95.0)));
        assert!(!corners.contains(Point::new(-1.0, 40.0)));
        assert!(!corners.contains(Point::new(50.0, 120.0)));
    }

    #[test]
    fn test_is_finite() {
        let mut corners = Corners::from_rect(&Rect::from_size(10.0, 10.0));
        assert!(corners.is_finite());
        corners[Corner::BottomLeft] = Point::new(0.0, f64::INFINITY);
        assert!(!corners.is_finite());
        assert!(!Point::new(f64::NAN, 1.0).is_finite());
    }

    #[test]
    fn test_corner_parse() {
        assert_eq!("TL".parse::<Corner>().unwrap(), Corner::TopLeft);
        assert_eq!("bottom-right".parse::<Corner>().unwrap(), Corner::BottomRight);
        assert!("middle".parse::<Corner>().is_err());
        assert_eq!(Corner::from_index(3), Some(Corner::BottomLeft));
        assert_eq!(Corner::from_index(4), None);
    }
}

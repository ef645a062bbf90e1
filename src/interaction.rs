//! Pointer and key driven corner editing
//!
//! The controller only decides *what* edit a gesture produces. Applying the
//! edit (and recomputing the warp) is left to the owner of the corners.

use serde::Serialize;

use crate::geometry::{Corner, Corners, Point, Rect};

/// Default corner-selection radius as a fraction of the base diagonal
pub const DEFAULT_SENSITIVITY: f64 = 0.5;

/// A pointer press, drag or release in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    /// Whether the move-all modifier (shift) is held
    pub modifier: bool,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            modifier: false,
        }
    }

    pub fn with_modifier(mut self, modifier: bool) -> Self {
        self.modifier = modifier;
        self
    }
}

/// Keys understood by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Other,
}

/// A change to the corner set requested by a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerEdit {
    /// Place one corner at an absolute position
    Set(Corner, Point),
    /// Move one corner by an offset
    Nudge(Corner, Point),
    /// Move every corner by an offset
    MoveAll(Point),
}

/// Observable state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "corner", rename_all = "kebab-case")]
pub enum InteractionState {
    Idle,
    CornerSelected(Corner),
    MovingAll,
}

/// Corner selection and drag state machine
#[derive(Debug, Clone)]
pub struct InteractionController {
    selected: Option<Corner>,
    /// Last pointer position while moving the whole shape
    move_all_anchor: Option<Point>,
    sensitivity: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            selected: None,
            move_all_anchor: None,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        match (self.move_all_anchor, self.selected) {
            (Some(_), _) => InteractionState::MovingAll,
            (None, Some(corner)) => InteractionState::CornerSelected(corner),
            (None, None) => InteractionState::Idle,
        }
    }

    pub fn selected_corner(&self) -> Option<Corner> {
        self.selected
    }

    pub fn select(&mut self, corner: Corner) {
        self.selected = Some(corner);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = sensitivity;
    }

    /// Reset selection and mode, keeping nothing from previous gestures
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start a gesture: either grab the whole shape or pick the nearest corner
    pub fn pointer_pressed(&mut self, event: PointerEvent, corners: &Corners, base: &Rect) {
        if event.modifier && corners.contains(event.position) {
            tracing::debug!("Moving all corners from {}", event.position);
            self.move_all_anchor = Some(event.position);
            return;
        }

        self.move_all_anchor = None;
        self.selected = nearest_corner(event.position, corners, self.sensitivity * base.diagonal());
        tracing::debug!("Selected corner: {:?}", self.selected);
    }

    /// Continue a gesture, returning the edit it implies
    pub fn pointer_dragged(&mut self, event: PointerEvent) -> Option<CornerEdit> {
        if !event.modifier && self.move_all_anchor.is_some() {
            self.move_all_anchor = None;
        }

        if let Some(anchor) = self.move_all_anchor {
            self.move_all_anchor = Some(event.position);
            return Some(CornerEdit::MoveAll(event.position - anchor));
        }

        self.selected
            .map(|corner| CornerEdit::Set(corner, event.position))
    }

    /// Selection persists past the end of a drag
    pub fn pointer_released(&mut self, _event: PointerEvent) {}

    /// Arrow keys nudge the selected corner by one unit
    pub fn key_pressed(&mut self, key: Key) -> Option<CornerEdit> {
        let corner = self.selected?;
        let by = match key {
            Key::Up => Point::new(0.0, -1.0),
            Key::Down => Point::new(0.0, 1.0),
            Key::Left => Point::new(-1.0, 0.0),
            Key::Right => Point::new(1.0, 0.0),
            Key::Other => return None,
        };
        Some(CornerEdit::Nudge(corner, by))
    }
}

/// Closest corner strictly inside `radius`; ties go to the earlier corner
fn nearest_corner(p: Point, corners: &Corners, radius: f64) -> Option<Corner> {
    let mut best: Option<(Corner, f64)> = None;
    for (corner, point) in corners.iter() {
        let dist = point.distance(p);
        let closer = best.map_or(true, |(_, d)| dist < d);
        if dist < radius && closer {
            best = Some((corner, dist));
        }
    }
    best.map(|(corner, _)| corner)
}

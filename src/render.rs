//! Drawing the warp through a host rendering context

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::homography::WarpMatrix;

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "default_alpha")]
    pub a: u8,
}

fn default_alpha() -> u8 {
    255
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// What the warper draws as a visual aid on top of the warped content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawSettings {
    /// Outline the base rectangle in warped space
    #[serde(default = "default_true")]
    pub draw_rectangle: bool,

    /// Draw a square marker on each corner
    #[serde(default = "default_true")]
    pub draw_corners: bool,

    /// Draw the aids even while the warper is inactive
    #[serde(default)]
    pub force_drawing: bool,

    #[serde(default = "default_rectangle_color")]
    pub rectangle_color: Color,

    #[serde(default = "default_corners_color")]
    pub corners_color: Color,

    #[serde(default = "default_selected_corner_color")]
    pub selected_corner_color: Color,

    /// Side length of the corner markers
    #[serde(default = "default_corner_size")]
    pub corner_size: f64,
}

fn default_true() -> bool {
    true
}

fn default_rectangle_color() -> Color {
    Color::rgb(255, 255, 255)
}

fn default_corners_color() -> Color {
    Color::rgb(255, 255, 0)
}

fn default_selected_corner_color() -> Color {
    Color::rgb(255, 0, 0)
}

fn default_corner_size() -> f64 {
    10.0
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            draw_rectangle: true,
            draw_corners: true,
            force_drawing: false,
            rectangle_color: default_rectangle_color(),
            corners_color: default_corners_color(),
            selected_corner_color: default_selected_corner_color(),
            corner_size: default_corner_size(),
        }
    }
}

/// The subset of a 2D/3D graphics context the warper draws with
pub trait RenderContext {
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn mult_matrix(&mut self, matrix: &WarpMatrix);
    fn translate(&mut self, dx: f64, dy: f64);
    fn set_color(&mut self, color: Color);
    /// Unfilled rectangle outline
    fn draw_rect_outline(&mut self, rect: &Rect);
    /// Filled square centered on `center`
    fn draw_square(&mut self, center: Point, size: f64);
}

/// A single recorded drawing call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    PushMatrix,
    PopMatrix,
    MultMatrix { matrix: [[f64; 4]; 4] },
    Translate { dx: f64, dy: f64 },
    SetColor { color: Color },
    RectOutline { rect: Rect },
    Square { center: Point, size: f64 },
}

/// Render context that records calls instead of drawing
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderContext for CommandRecorder {
    fn push_matrix(&mut self) {
        self.commands.push(DrawCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        self.commands.push(DrawCommand::PopMatrix);
    }

    fn mult_matrix(&mut self, matrix: &WarpMatrix) {
        self.commands.push(DrawCommand::MultMatrix {
            matrix: matrix.rows(),
        });
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.commands.push(DrawCommand::Translate { dx, dy });
    }

    fn set_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetColor { color });
    }

    fn draw_rect_outline(&mut self, rect: &Rect) {
        self.commands.push(DrawCommand::RectOutline { rect: *rect });
    }

    fn draw_square(&mut self, center: Point, size: f64) {
        self.commands.push(DrawCommand::Square { center, size });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_settings_defaults_from_toml() {
        let settings: DrawSettings = toml::from_str("force_drawing = true").unwrap();
        assert!(settings.draw_rectangle);
        assert!(settings.draw_corners);
        assert!(settings.force_drawing);
        assert_eq!(settings.corner_size, 10.0);
        assert_eq!(settings.selected_corner_color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_color_alpha_default() {
        let color: Color = toml::from_str("r = 1\ng = 2\nb = 3").unwrap();
        assert_eq!(color, Color::rgb(1, 2, 3));
    }
}

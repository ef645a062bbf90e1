//! The interactive four-corner warper
//!
//! Owns the base rectangle, the corners and the derived warp matrix. Every
//! corner or rectangle change recomputes the matrix straight away; when the
//! new shape is degenerate the last good matrix stays in place.

use tracing::{debug, warn};

use crate::error::WarpError;
use crate::geometry::{Corner, Corners, Point, Rect};
use crate::homography::{compute_warp, WarpMatrix};
use crate::host::{HostPort, InputChannel};
use crate::interaction::{CornerEdit, InteractionController, InteractionState, Key, PointerEvent};
use crate::mapper;
use crate::render::{DrawSettings, RenderContext};

/// A quadrilateral warp editable with pointer and keys
pub struct Warper<H: HostPort> {
    host: H,
    base: Rect,
    corners: Corners,
    matrix: WarpMatrix,
    /// Why the current corners could not produce a warp, if they couldn't
    last_error: Option<WarpError>,
    controller: InteractionController,
    active: bool,
    use_keys: bool,
    use_pointer: bool,
    pub draw_settings: DrawSettings,
}

impl<H: HostPort> Warper<H> {
    /// Create a warper covering the host's canvas
    pub fn new(host: H) -> Self {
        let (width, height) = host.canvas_size();
        Self::with_rect(host, Rect::from_size(width, height))
    }

    /// Create a warper over an explicit base rectangle
    pub fn with_rect(host: H, rect: Rect) -> Self {
        let mut warper = Self {
            host,
            base: rect,
            corners: Corners::from_rect(&rect),
            matrix: WarpMatrix::identity(),
            last_error: None,
            controller: InteractionController::new(),
            active: false,
            use_keys: true,
            use_pointer: true,
            draw_settings: DrawSettings::default(),
        };
        warper.setup_rect(rect);
        warper
    }

    /// Reset to the host's canvas size
    pub fn setup(&mut self) {
        let (width, height) = self.host.canvas_size();
        self.setup_rect(Rect::from_size(width, height));
    }

    pub fn setup_size(&mut self, width: f64, height: f64) {
        self.setup_rect(Rect::from_size(width, height));
    }

    /// Reset the base rectangle and put the corners on its extremes
    ///
    /// Also deactivates the warper, clears the selection and restores the
    /// default sensitivity and input channels.
    pub fn setup_rect(&mut self, rect: Rect) {
        debug!(
            "Warper setup: {} {} {} {}",
            rect.x, rect.y, rect.width, rect.height
        );

        self.corners = Corners::from_rect(&rect);
        self.deactivate();
        self.matrix = WarpMatrix::identity();
        self.base = rect;
        self.controller.reset();
        self.use_keys = true;
        self.use_pointer = true;

        self.recompute();
    }

    /// Move to a new base rectangle while keeping the current warp on screen
    ///
    /// The new rectangle's corners are pushed through the current warp, so
    /// content drawn at the same screen position lands where it did before.
    ///
    /// Fails without touching anything while the current corners are
    /// degenerate, since the last good matrix no longer describes them.
    pub fn re_setup_warped(&mut self, rect: Rect) -> Result<(), WarpError> {
        if let Some(e) = &self.last_error {
            return Err(e.clone());
        }
        let mut corners = [Point::ZERO; 4];
        for (dst, src) in corners.iter_mut().zip(rect.corners()) {
            *dst = self.to_warped_space(src)?;
        }
        debug!(
            "Warper re-setup: {} {} {} {}",
            rect.x, rect.y, rect.width, rect.height
        );

        self.corners = Corners(corners);
        self.base = rect;
        self.recompute();
        Ok(())
    }

    /// Derive the matrix from the current state, keeping the old one on failure
    fn recompute(&mut self) {
        match compute_warp(&self.base, &self.corners) {
            Ok(matrix) => {
                self.matrix = matrix;
                self.last_error = None;
            }
            Err(e) => {
                warn!("Keeping previous warp: {}", e);
                self.last_error = Some(e);
            }
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn base_rect(&self) -> Rect {
        self.base
    }

    /// The last successfully derived warp
    pub fn matrix(&self) -> WarpMatrix {
        self.matrix
    }

    pub fn last_error(&self) -> Option<&WarpError> {
        self.last_error.as_ref()
    }

    /// Whether the corners currently fail to define a warp
    pub fn is_degenerate(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn corners(&self) -> &Corners {
        &self.corners
    }

    pub fn corner(&self, corner: Corner) -> Point {
        self.corners[corner]
    }

    pub fn set_corner(&mut self, corner: Corner, p: Point) {
        let mut corners = self.corners;
        corners[corner] = p;
        self.commit(corners);
    }

    /// Replace all four corners (top-left, top-right, bottom-right, bottom-left)
    /// with a single recomputation
    pub fn set_all_corners(&mut self, corners: [Point; 4]) {
        self.commit(Corners(corners));
    }

    pub fn move_corner(&mut self, corner: Corner, by: Point) {
        let mut corners = self.corners;
        corners[corner] += by;
        self.commit(corners);
    }

    pub fn move_all_corners(&mut self, by: Point) {
        let mut corners = self.corners;
        corners.translate(by);
        self.commit(corners);
    }

    /// Store new corners and recompute, dropping edits with non-finite values
    fn commit(&mut self, corners: Corners) {
        if !corners.is_finite() {
            warn!("Ignoring corner edit with non-finite coordinates");
            return;
        }
        self.corners = corners;
        self.recompute();
    }

    /// Where the warp places a screen point
    pub fn to_warped_space(&self, p: Point) -> Result<Point, WarpError> {
        mapper::to_warped_space(p, &self.matrix, &self.base)
    }

    /// The screen point the warp moved to `p`
    pub fn to_screen_space(&self, p: Point) -> Result<Point, WarpError> {
        mapper::to_screen_space(p, &self.matrix, &self.base)
    }

    pub fn sensitivity(&self) -> f64 {
        self.controller.sensitivity()
    }

    /// Selection radius as a fraction of the base rectangle's diagonal
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.controller.set_sensitivity(sensitivity);
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn is_corner_selected(&self) -> bool {
        self.controller.selected_corner().is_some()
    }

    pub fn selected_corner(&self) -> Option<Corner> {
        self.controller.selected_corner()
    }

    pub fn select_corner(&mut self, corner: Corner) {
        self.controller.select(corner);
    }

    pub fn deselect(&mut self) {
        self.controller.deselect();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn keys_enabled(&self) -> bool {
        self.use_keys
    }

    pub fn pointer_enabled(&self) -> bool {
        self.use_pointer
    }

    /// Take or release input focus, subscribing to the enabled channels
    pub fn activate(&mut self, on: bool) {
        if on && !self.active {
            if self.use_pointer {
                self.host.subscribe(InputChannel::Pointer);
            }
            if self.use_keys {
                self.host.subscribe(InputChannel::Keys);
            }
            self.active = true;
            debug!("Warper activated");
        } else if !on && self.active {
            if self.use_pointer {
                self.host.unsubscribe(InputChannel::Pointer);
            }
            if self.use_keys {
                self.host.unsubscribe(InputChannel::Keys);
            }
            self.active = false;
            debug!("Warper deactivated");
        }
    }

    pub fn deactivate(&mut self) {
        self.activate(false);
    }

    pub fn toggle_active(&mut self) {
        self.activate(!self.active);
    }

    pub fn enable_keys(&mut self, on: bool) {
        if self.use_keys != on {
            if self.active {
                self.switch_channel(InputChannel::Keys, on);
            }
            self.use_keys = on;
        }
    }

    pub fn toggle_keys(&mut self) {
        self.enable_keys(!self.use_keys);
    }

    pub fn enable_pointer(&mut self, on: bool) {
        if self.use_pointer != on {
            if self.active {
                self.switch_channel(InputChannel::Pointer, on);
            }
            self.use_pointer = on;
        }
    }

    pub fn toggle_pointer(&mut self) {
        self.enable_pointer(!self.use_pointer);
    }

    fn switch_channel(&mut self, channel: InputChannel, on: bool) {
        if on {
            self.host.subscribe(channel);
        } else {
            self.host.unsubscribe(channel);
        }
    }

    fn accepts(&self, channel: InputChannel) -> bool {
        self.active
            && match channel {
                InputChannel::Pointer => self.use_pointer,
                InputChannel::Keys => self.use_keys,
            }
    }

    pub fn pointer_pressed(&mut self, event: PointerEvent) {
        if self.accepts(InputChannel::Pointer) {
            self.controller
                .pointer_pressed(event, &self.corners, &self.base);
        }
    }

    pub fn pointer_dragged(&mut self, event: PointerEvent) {
        if !self.accepts(InputChannel::Pointer) {
            return;
        }
        if let Some(edit) = self.controller.pointer_dragged(event) {
            self.apply_edit(edit);
        }
    }

    pub fn pointer_released(&mut self, event: PointerEvent) {
        if self.accepts(InputChannel::Pointer) {
            self.controller.pointer_released(event);
        }
    }

    pub fn key_pressed(&mut self, key: Key) {
        if !self.accepts(InputChannel::Keys) {
            return;
        }
        if let Some(edit) = self.controller.key_pressed(key) {
            self.apply_edit(edit);
        }
    }

    fn apply_edit(&mut self, edit: CornerEdit) {
        match edit {
            CornerEdit::Set(corner, p) => self.set_corner(corner, p),
            CornerEdit::Nudge(corner, by) => self.move_corner(corner, by),
            CornerEdit::MoveAll(by) => self.move_all_corners(by),
        }
    }

    /// Start drawing warped content
    ///
    /// Content drawn until [`Warper::end`] uses screen coordinates inside the
    /// base rectangle and comes out warped onto the corners.
    pub fn begin(&self, ctx: &mut impl RenderContext) {
        ctx.push_matrix();
        ctx.mult_matrix(&self.matrix);
        ctx.translate(-self.base.x, -self.base.y);
    }

    /// Finish warped drawing, adding the outline and corner markers
    pub fn end(&self, ctx: &mut impl RenderContext) {
        let settings = &self.draw_settings;
        let visible = self.active || settings.force_drawing;

        if settings.draw_rectangle && visible {
            ctx.set_color(settings.rectangle_color);
            ctx.draw_rect_outline(&self.base);
        }
        ctx.pop_matrix();

        if settings.draw_corners && visible {
            let selected = self.controller.selected_corner();
            for (corner, p) in self.corners.iter() {
                if selected == Some(corner) {
                    ctx.set_color(settings.selected_corner_color);
                } else {
                    ctx.set_color(settings.corners_color);
                }
                ctx.draw_square(p, settings.corner_size);
            }
        }
    }
}

impl<H: HostPort> Drop for Warper<H> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

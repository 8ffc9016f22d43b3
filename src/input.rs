//! Mouse input for orbiting and zooming the view
//!
//! Hosts forward raw pointer events to a [`Controller`]. Dragging rotates the
//! whole graph about the origin; the wheel feeds the camera's zoom velocity.

use std::sync::Arc;

use crate::surface::ScreenPoint;
use crate::vector::Vector;
use crate::world::World;

/// Radians of rotation per pixel dragged
pub const DRAG_MULTIPLIER: f64 = 0.005;

/// Rotation axis and angle for a drag of `(dx, dy)` pixels.
///
/// Horizontal motion turns about the y axis and vertical motion about the x
/// axis. `None` for a zero delta, which has no axis.
pub fn drag_rotation(dx: f64, dy: f64) -> Option<(Vector, f64)> {
    let delta = Vector::new(dx, dy, 0.0);
    let magnitude = delta.magnitude();
    if magnitude <= 0.0 {
        return None;
    }
    Some((Vector::new(dy, dx, 0.0), magnitude * DRAG_MULTIPLIER))
}

/// Translates pointer events into world rotations and camera moves
pub struct Controller {
    world: Arc<World>,
    previous: ScreenPoint,
    dragging: bool,
}

impl Controller {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            previous: ScreenPoint::default(),
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Start a drag and cancel any zoom inertia
    pub fn mouse_down(&mut self, x: i32, y: i32) {
        self.previous = ScreenPoint::new(x, y);
        self.dragging = true;
        self.world.stop_camera();
    }

    pub fn mouse_move(&mut self, x: i32, y: i32) {
        let dx = x - self.previous.x;
        let dy = y - self.previous.y;
        if self.dragging {
            if let Some((axis, angle)) = drag_rotation(dx as f64, dy as f64) {
                self.world.rotate(Vector::ZERO, axis, angle);
            }
        }
        self.previous = ScreenPoint::new(x, y);
    }

    pub fn mouse_up(&mut self) {
        self.dragging = false;
    }

    pub fn mouse_wheel(&mut self, delta: i32) {
        self.world.move_camera(delta as f64);
    }
}

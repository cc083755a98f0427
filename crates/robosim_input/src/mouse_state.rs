//! Mouse-driven camera navigation
//!
//! Controls:
//! - Left drag: orbit the look-at point (Shift reports `RotateH`, which orbits the same way)
//! - Right drag: pan vertically (Shift: pan horizontally)
//! - Middle drag / scroll: zoom

use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::ModifiersState;

/// Default zoom step per scroll line
pub const DEFAULT_SCROLL_SENSITIVITY: f32 = 0.05;

/// Pixels treated as one scroll line for touchpad (pixel) scrolling
const PIXELS_PER_LINE: f64 = 20.0;

/// Camera navigation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    /// Pan in the horizontal plane
    MoveH,
    /// Pan in the vertical plane
    MoveV,
    /// Left drag with shift held; orbits like [`MouseAction::RotateV`]
    RotateH,
    /// Rotate around the look-at point
    RotateV,
    /// Dolly toward or away from the look-at point
    Zoom,
}

/// Pick the navigation mode for the held buttons.
///
/// Right takes priority over left, left over middle. Returns `None` when no
/// button is held.
pub fn action_for(left: bool, middle: bool, right: bool, shift: bool) -> Option<MouseAction> {
    if right {
        Some(if shift { MouseAction::MoveH } else { MouseAction::MoveV })
    } else if left {
        Some(if shift { MouseAction::RotateH } else { MouseAction::RotateV })
    } else if middle {
        Some(MouseAction::Zoom)
    } else {
        None
    }
}

/// A navigation request with deltas relative to the window height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    pub action: MouseAction,
    pub reldx: f32,
    pub reldy: f32,
}

impl CameraMove {
    /// Apply this move to a camera
    pub fn apply<C: CameraNavigation + ?Sized>(&self, camera: &mut C) {
        camera.move_camera(self.action, self.reldx, self.reldy);
    }
}

/// Mouse button, modifier, and cursor tracking
#[derive(Debug, Clone)]
pub struct MouseState {
    left: bool,
    middle: bool,
    right: bool,
    shift: bool,

    // Cursor position at the last event; drag deltas are measured from here
    last_x: f64,
    last_y: f64,

    pub scroll_sensitivity: f32,
}

impl Default for MouseState {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseState {
    pub fn new() -> Self {
        Self {
            left: false,
            middle: false,
            right: false,
            shift: false,
            last_x: 0.0,
            last_y: 0.0,
            scroll_sensitivity: DEFAULT_SCROLL_SENSITIVITY,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Middle => self.middle = pressed,
            MouseButton::Right => self.right = pressed,
            _ => {}
        }
    }

    /// Process modifier key changes
    pub fn process_modifiers(&mut self, modifiers: ModifiersState) {
        self.shift = modifiers.shift_key();
    }

    /// Process cursor movement.
    ///
    /// Returns the camera move for the current drag, or `None` when no
    /// button is held or the window has no height.
    pub fn process_cursor_moved(&mut self, x: f64, y: f64, window_height: u32) -> Option<CameraMove> {
        let dx = x - self.last_x;
        let dy = y - self.last_y;
        self.last_x = x;
        self.last_y = y;

        let action = action_for(self.left, self.middle, self.right, self.shift)?;
        if window_height == 0 {
            return None;
        }

        let height = f64::from(window_height);
        Some(CameraMove {
            action,
            reldx: (dx / height) as f32,
            reldy: (dy / height) as f32,
        })
    }

    /// Process scroll wheel input
    pub fn process_scroll(&mut self, delta: MouseScrollDelta) -> CameraMove {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => f64::from(y),
            MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_LINE,
        };
        CameraMove {
            action: MouseAction::Zoom,
            reldx: 0.0,
            reldy: self.scroll_sensitivity * lines as f32,
        }
    }

    /// Check if any button is held
    pub fn is_dragging(&self) -> bool {
        self.left || self.middle || self.right
    }

    /// Current cursor position
    pub fn cursor(&self) -> (f64, f64) {
        (self.last_x, self.last_y)
    }

    /// Builder: set zoom step per scroll line
    pub fn with_scroll_sensitivity(mut self, sensitivity: f32) -> Self {
        self.scroll_sensitivity = sensitivity;
        self
    }
}

/// Trait for camera navigation
/// Allows mouse input to drive different camera implementations
pub trait CameraNavigation {
    /// Move the camera. `reldx` and `reldy` are cursor deltas divided by
    /// the window height.
    fn move_camera(&mut self, action: MouseAction, reldx: f32, reldy: f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[derive(Default)]
    struct RecordingCamera {
        moves: Vec<(MouseAction, f32, f32)>,
    }

    impl CameraNavigation for RecordingCamera {
        fn move_camera(&mut self, action: MouseAction, reldx: f32, reldy: f32) {
            self.moves.push((action, reldx, reldy));
        }
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(action_for(false, false, true, false), Some(MouseAction::MoveV));
        assert_eq!(action_for(false, false, true, true), Some(MouseAction::MoveH));
        assert_eq!(action_for(true, false, false, false), Some(MouseAction::RotateV));
        assert_eq!(action_for(true, false, false, true), Some(MouseAction::RotateH));
        assert_eq!(action_for(false, true, false, false), Some(MouseAction::Zoom));
        assert_eq!(action_for(false, true, false, true), Some(MouseAction::Zoom));
        assert_eq!(action_for(false, false, false, true), None);
    }

    #[test]
    fn test_button_priority() {
        // right beats left beats middle
        assert_eq!(action_for(true, true, true, false), Some(MouseAction::MoveV));
        assert_eq!(action_for(true, true, false, false), Some(MouseAction::RotateV));
    }

    #[test]
    fn test_move_without_button_only_tracks_cursor() {
        let mut mouse = MouseState::new();
        assert_eq!(mouse.process_cursor_moved(100.0, 50.0, 900), None);
        assert_eq!(mouse.cursor(), (100.0, 50.0));
    }

    #[test]
    fn test_drag_deltas_relative_to_height() {
        let mut mouse = MouseState::new();
        mouse.process_cursor_moved(100.0, 100.0, 900);
        mouse.process_mouse_button(MouseButton::Left, ElementState::Pressed);

        let m = mouse.process_cursor_moved(190.0, 145.0, 900).unwrap();
        assert_eq!(m.action, MouseAction::RotateV);
        assert!((m.reldx - 0.1).abs() < 1e-6);
        assert!((m.reldy - 0.05).abs() < 1e-6);

        // deltas are measured from the previous event
        let m = mouse.process_cursor_moved(190.0, 154.0, 900).unwrap();
        assert_eq!(m.reldx, 0.0);
        assert!((m.reldy - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_shift_switches_mode() {
        let mut mouse = MouseState::new();
        mouse.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        mouse.process_modifiers(ModifiersState::SHIFT);
        let m = mouse.process_cursor_moved(10.0, 0.0, 100).unwrap();
        assert_eq!(m.action, MouseAction::MoveH);

        mouse.process_modifiers(ModifiersState::empty());
        let m = mouse.process_cursor_moved(20.0, 0.0, 100).unwrap();
        assert_eq!(m.action, MouseAction::MoveV);
    }

    #[test]
    fn test_release_stops_drag() {
        let mut mouse = MouseState::new();
        mouse.process_mouse_button(MouseButton::Middle, ElementState::Pressed);
        assert!(mouse.is_dragging());
        mouse.process_mouse_button(MouseButton::Middle, ElementState::Released);
        assert!(!mouse.is_dragging());
        assert_eq!(mouse.process_cursor_moved(5.0, 5.0, 100), None);
    }

    #[test]
    fn test_zero_height_window() {
        let mut mouse = MouseState::new();
        mouse.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(mouse.process_cursor_moved(5.0, 5.0, 0), None);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut mouse = MouseState::new();
        let m = mouse.process_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        assert_eq!(m.action, MouseAction::Zoom);
        assert_eq!(m.reldx, 0.0);
        assert!((m.reldy - 0.1).abs() < 1e-6);

        let m = mouse.process_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -20.0)));
        assert!((m.reldy + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_apply_forwards_to_camera() {
        let mut camera = RecordingCamera::default();
        let mut mouse = MouseState::new().with_scroll_sensitivity(0.1);
        mouse.process_scroll(MouseScrollDelta::LineDelta(0.0, 1.0)).apply(&mut camera);
        assert_eq!(camera.moves, vec![(MouseAction::Zoom, 0.0, 0.1)]);
    }
}

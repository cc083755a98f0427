//! Mouse Input Handling
//!
//! This crate turns mouse buttons, drags and scrolling into camera
//! navigation requests, independent of any particular camera.

mod mouse_state;

pub use mouse_state::{
    action_for, CameraMove, CameraNavigation, MouseAction, MouseState, DEFAULT_SCROLL_SENSITIVITY,
};

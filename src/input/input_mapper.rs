//! Input mapping from raw events to semantic actions
//!
//! Maps keyboard input to high-level actions like Exit, ResetSimulation, etc.
//! Mouse buttons, drags and scrolling are NOT mapped here - they go directly
//! to the MouseState.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Actions triggered by key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Exit application (Escape)
    Exit,
    /// Restore the model's initial configuration (Backspace)
    ResetSimulation,
    /// Pause or resume stepping (Space)
    TogglePause,
    /// Reset camera to its initial framing (R key)
    ResetCamera,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
    /// Show or hide the world frame (W key)
    ToggleWorldFrame,
}

/// Maps raw input events to semantic actions
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` for bound keys on press, `None` otherwise
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => Some(InputAction::Exit),
            KeyCode::Backspace => Some(InputAction::ResetSimulation),
            KeyCode::Space => Some(InputAction::TogglePause),
            KeyCode::KeyR => Some(InputAction::ResetCamera),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            KeyCode::KeyW => Some(InputAction::ToggleWorldFrame),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_exits() {
        let action = InputMapper::map_keyboard(KeyCode::Escape, ElementState::Pressed);
        assert_eq!(action, Some(InputAction::Exit));
    }

    #[test]
    fn test_unbound_keys_not_mapped() {
        for key in [KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD, KeyCode::Enter] {
            let action = InputMapper::map_keyboard(key, ElementState::Pressed);
            assert_eq!(action, None, "Key {:?} should not be mapped", key);
        }
    }

    #[test]
    fn test_key_release_ignored() {
        let action = InputMapper::map_keyboard(KeyCode::Escape, ElementState::Released);
        assert_eq!(action, None);
    }

    #[test]
    fn test_special_keys() {
        let cases = [
            (KeyCode::Backspace, InputAction::ResetSimulation),
            (KeyCode::Space, InputAction::TogglePause),
            (KeyCode::KeyR, InputAction::ResetCamera),
            (KeyCode::KeyF, InputAction::ToggleFullscreen),
            (KeyCode::KeyW, InputAction::ToggleWorldFrame),
        ];
        for (key, expected) in cases {
            assert_eq!(
                InputMapper::map_keyboard(key, ElementState::Pressed),
                Some(expected)
            );
        }
    }
}

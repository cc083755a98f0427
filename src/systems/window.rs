//! Window management system
//!
//! Handles window creation, fullscreen toggle, and title updates.

use std::sync::Arc;
use thiserror::Error;
use winit::{
    event_loop::ActiveEventLoop,
    window::{Fullscreen, Window},
};
use crate::config::WindowConfig;

/// Manages the application window
pub struct WindowSystem {
    window: Arc<Window>,
    base_title: String,
}

impl WindowSystem {
    /// Create window from config
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Self, WindowError> {
        let mut attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.width,
                config.height,
            ));

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(attrs)?);
        log::info!("Created window {}x{}", config.width, config.height);

        Ok(Self {
            window,
            base_title: config.title.clone(),
        })
    }

    /// Get window reference (for RenderContext creation)
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Current framebuffer height in pixels
    pub fn height(&self) -> u32 {
        self.window.inner_size().height
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&self) {
        let new_fullscreen = if self.window.fullscreen().is_some() {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        };
        self.window.set_fullscreen(new_fullscreen);
    }

    /// Update window title with simulation state
    pub fn update_title(&self, sim_time: f64, paused: bool) {
        self.window.set_title(&format_title(&self.base_title, sim_time, paused));
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

fn format_title(base: &str, sim_time: f64, paused: bool) -> String {
    if paused {
        format!("{} - t = {:.2} s [paused]", base, sim_time)
    } else {
        format!("{} - t = {:.2} s", base, sim_time)
    }
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Window creation failed: {0}")]
    CreationFailed(#[from] winit::error::OsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_running() {
        let title = format_title("Sim", 1.234, false);
        assert_eq!(title, "Sim - t = 1.23 s");
    }

    #[test]
    fn test_title_paused() {
        let title = format_title("Sim", 0.5, true);
        assert!(title.ends_with("[paused]"));
    }
}

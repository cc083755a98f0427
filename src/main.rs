//! robosim - robot model viewer
//!
//! Loads a robot model, steps its physics every frame, and renders it in a
//! window with mouse camera control.

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use robosim::config::AppConfig;
use robosim::input::{InputAction, InputMapper};
use robosim::systems::{RenderError, RenderSystem, SimulationSystem, WindowSystem};
use robosim_input::MouseState;
use robosim_render::{FreeCamera, VisOptions};

/// Main application state
struct App {
    /// Application configuration
    config: AppConfig,
    simulation: SimulationSystem,
    camera: FreeCamera,
    mouse: MouseState,
    options: VisOptions,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    /// Process exit status, set to 1 by fatal init or GPU failures
    exit_code: i32,
}

impl App {
    fn new(config: AppConfig, simulation: SimulationSystem) -> Self {
        let camera = FreeCamera::new(&simulation.model().stat)
            .with_fovy(config.camera.fovy)
            .with_orientation(config.camera.azimuth, config.camera.elevation)
            .with_distance_scale(config.camera.distance_scale);

        let mouse = MouseState::new().with_scroll_sensitivity(config.camera.scroll_sensitivity);

        let options = VisOptions::default()
            .with_transparency(config.rendering.transparency)
            .with_world_frame(config.rendering.world_frame);

        Self {
            config,
            simulation,
            camera,
            mouse,
            options,
            window: None,
            render: None,
            exit_code: 0,
        }
    }

    /// Record a fatal failure and stop the event loop
    fn fail(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_code = 1;
        event_loop.exit();
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::ResetSimulation => self.simulation.reset(),
            InputAction::TogglePause => {
                self.simulation.toggle_pause();
            }
            InputAction::ResetCamera => {
                self.camera.reset();
                log::info!("Camera reset to starting position");
            }
            InputAction::ToggleFullscreen => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            InputAction::ToggleWorldFrame => {
                let shown = self.options.toggle_world_frame();
                log::info!("World frame: {}", if shown { "ON" } else { "OFF" });
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.simulation.update();

        if let Some(render) = &mut self.render {
            let result = render.render_frame(
                self.simulation.model(),
                self.simulation.data(),
                &self.camera,
                &self.options,
            );
            match result {
                Ok(()) => {}
                // Surface was reconfigured, the next frame retries
                Err(RenderError::SurfaceLost) => log::debug!("Surface lost, reconfigured"),
                Err(RenderError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    self.fail(event_loop);
                    return;
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        if let Some(window) = &self.window {
            if self.config.debug.show_sim_time {
                window.update_title(self.simulation.time(), self.simulation.is_paused());
            }
        }

        self.simulation.pace();

        // Request next frame
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                self.fail(event_loop);
                return;
            }
        };

        let render = match RenderSystem::new(
            window.window().clone(),
            self.config.rendering.clone(),
            self.config.window.vsync,
        ) {
            Ok(render) => render,
            Err(e) => {
                log::error!("{}", e);
                self.fail(event_loop);
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.render = Some(render);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if let Some(action) = InputMapper::map_keyboard(key, event.state) {
                        self.handle_action(event_loop, action);
                    }
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.mouse.process_modifiers(modifiers.state());
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse.process_mouse_button(button, state);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let height = self.window.as_ref().map_or(0, |w| w.height());
                if let Some(movement) = self.mouse.process_cursor_moved(position.x, position.y, height)
                {
                    movement.apply(&mut self.camera);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse.process_scroll(delta).apply(&mut self.camera);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn main() {
    let config = AppConfig::load();
    let log_level = config
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging; RUST_LOG still takes precedence
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    log::info!("Starting robosim");

    let config = config.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    let simulation = match SimulationSystem::load(&config.model.path, &config.simulation) {
        Ok(simulation) => simulation,
        Err(e) => {
            println!("{}", e);
            log::error!("Failed to load model '{}': {}", config.model.path, e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Loaded model '{}': {} bodies, {} geoms",
        simulation.model().name,
        simulation.model().bodies.len(),
        simulation.model().geoms.len()
    );

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            drop(simulation);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, simulation);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        app.exit_code = 1;
    }

    // process::exit skips destructors, so release everything first
    let code = app.exit_code;
    drop(app);
    std::process::exit(code);
}

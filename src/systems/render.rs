//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - Scene construction and the instanced scene pipeline
//! - Frame rendering

use std::sync::Arc;
use thiserror::Error;
use winit::window::Window;
use robosim_model::Model;
use robosim_physics::Data;
use robosim_render::{
    context::{ContextError, RenderContext},
    pipeline::{SceneUniforms, ScenePipeline},
    FreeCamera, Scene, VisOptions,
};
use crate::config::RenderingConfig;

/// Render error types
#[derive(Debug, Error)]
pub enum RenderError {
    /// GPU could not be initialized
    #[error("GPU initialization failed: {0}")]
    Init(#[from] ContextError),
    /// Surface was lost or outdated (window resized, minimized, etc.)
    #[error("Surface lost")]
    SurfaceLost,
    /// GPU out of memory
    #[error("Out of memory")]
    OutOfMemory,
    /// Other surface error
    #[error("Render error: {0}")]
    Other(String),
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    pipeline: ScenePipeline,
    scene: Scene,
    config: RenderingConfig,
}

impl RenderSystem {
    /// Create render system from window and config
    pub fn new(
        window: Arc<Window>,
        config: RenderingConfig,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(window, vsync))?;

        let mut pipeline = ScenePipeline::new(
            &context.device,
            context.config.format,
            config.max_geoms,
        );

        // Ensure depth texture exists
        pipeline.ensure_depth_texture(
            &context.device,
            context.config.width,
            context.config.height,
        );

        log::info!(
            "Renderer ready: {:?}, {}x{}",
            context.config.format,
            context.config.width,
            context.config.height
        );

        Ok(Self {
            context,
            pipeline,
            scene: Scene::new(config.max_geoms),
            config,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
        self.pipeline.ensure_depth_texture(
            &self.context.device,
            self.context.config.width,
            self.context.config.height,
        );
    }

    /// Render a single frame of the current simulation state
    pub fn render_frame(
        &mut self,
        model: &Model,
        data: &Data,
        camera: &FreeCamera,
        options: &VisOptions,
    ) -> Result<(), RenderError> {
        self.scene.update(model, data, options);
        self.pipeline.upload_scene(&self.context.queue, &self.scene);

        let eye = camera.eye();
        let uniforms = SceneUniforms {
            view_matrix: camera.view_matrix(),
            projection_matrix: camera.projection_matrix(self.context.aspect_ratio()),
            light_dir: light_direction(model, self.config.light_dir),
            ambient_strength: self.config.ambient_strength,
            light_color: light_color(model),
            diffuse_strength: self.config.diffuse_strength,
            eye: [eye.x, eye.y, eye.z],
            specular_strength: self.config.specular_strength,
        };
        self.pipeline.update_uniforms(&self.context.queue, &uniforms);

        // Get surface texture
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Other(format!("{:?}", e))),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let bg = &self.config.background_color;
        self.pipeline.render(
            &mut encoder,
            &view,
            wgpu::Color {
                r: bg[0] as f64,
                g: bg[1] as f64,
                b: bg[2] as f64,
                a: bg[3] as f64,
            },
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Direction of the first directional light in the model, else `fallback`
fn light_direction(model: &Model, fallback: [f32; 3]) -> [f32; 3] {
    model
        .lights
        .iter()
        .find(|light| light.directional)
        .map(|light| [light.dir.x, light.dir.y, light.dir.z])
        .unwrap_or(fallback)
}

/// Diffuse color of the first model light, white without lights
fn light_color(model: &Model) -> [f32; 3] {
    model
        .lights
        .first()
        .map(|light| light.diffuse)
        .unwrap_or([1.0; 3])
}

//! Rendering Library
//!
//! This crate provides the wgpu-based rendering of a simulated robot model.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`camera::FreeCamera`] - orbit camera driven by mouse navigation
//! - [`scene::Scene`] - bounded list of primitive instances built each frame
//! - [`options::VisOptions`] - category filter and display toggles
//! - [`pipeline::ScenePipeline`] - instanced drawing with lighting

pub mod camera;
pub mod context;
pub mod mesh;
pub mod options;
pub mod pipeline;
pub mod scene;

pub use camera::FreeCamera;
pub use context::{ContextError, RenderContext};
pub use mesh::{Mesh, MeshKind};
pub use options::{Category, VisOptions};
pub use scene::{DrawBatch, Scene, SceneGeom, DEFAULT_MAX_GEOMS};

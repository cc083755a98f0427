//! Rendering pipeline components
//!
//! GPU data layouts and the instanced pipeline that draws the scene.

pub mod scene_pipeline;
pub mod types;

pub use scene_pipeline::{look_at_matrix, perspective_matrix, ScenePipeline};
pub use types::{GeomInstance, MeshVertex, SceneUniforms};

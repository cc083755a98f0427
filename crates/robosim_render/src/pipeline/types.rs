//! GPU-compatible data types for the scene pipeline
//!
//! These types are designed to match the shader layouts exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bytemuck::{Pod, Zeroable};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A vertex of a unit primitive mesh
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-instance data for one scene geom
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GeomInstance {
    /// Model matrix columns (rotation * scale, then translation)
    pub model: [[f32; 4]; 4],
    /// Normal matrix columns (inverse transpose of the model's 3x3 part)
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// x: checker cell size in world units (0 disables), yzw unused
    pub pattern: [f32; 4],
}

impl Default for GeomInstance {
    fn default() -> Self {
        Self {
            model: IDENTITY,
            normal: [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]],
            color: [1.0; 4],
            pattern: [0.0; 4],
        }
    }
}

impl GeomInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GeomInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Scene uniforms
/// Layout: 176 bytes total (must match scene.wgsl SceneUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    /// View matrix (64 bytes)
    pub view_matrix: [[f32; 4]; 4],
    /// Projection matrix (64 bytes)
    pub projection_matrix: [[f32; 4]; 4],
    /// Direction light travels in (normalized) + ambient strength (16 bytes)
    pub light_dir: [f32; 3],
    pub ambient_strength: f32,
    /// Light color + diffuse strength (16 bytes)
    pub light_color: [f32; 3],
    pub diffuse_strength: f32,
    /// Camera position + specular strength (16 bytes)
    pub eye: [f32; 3],
    pub specular_strength: f32,
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            view_matrix: IDENTITY,
            projection_matrix: IDENTITY,
            light_dir: [0.0, 0.0, -1.0],
            ambient_strength: 0.3,
            light_color: [1.0; 3],
            diffuse_strength: 0.7,
            eye: [0.0; 3],
            specular_strength: 0.2,
        }
    }
}

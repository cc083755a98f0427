//! Unit primitive meshes
//!
//! Every scene geom is drawn as an instance of one of these meshes, scaled
//! by its size:
//! - Sphere: radius 1
//! - Cylinder: radius 1, half-height 1 along Z, capped
//! - Box: half-extent 1 on every axis
//! - Plane: the square [-1, 1]² at z = 0 facing +Z

use std::f32::consts::{PI, TAU};

use crate::pipeline::MeshVertex;

const SPHERE_STACKS: u32 = 16;
const SPHERE_SLICES: u32 = 24;
const CYLINDER_SLICES: u32 = 24;

/// Primitive mesh shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKind {
    Sphere,
    Cylinder,
    Box,
    Plane,
}

impl MeshKind {
    pub const ALL: [MeshKind; 4] = [MeshKind::Sphere, MeshKind::Cylinder, MeshKind::Box, MeshKind::Plane];

    pub fn index(self) -> usize {
        match self {
            MeshKind::Sphere => 0,
            MeshKind::Cylinder => 1,
            MeshKind::Box => 2,
            MeshKind::Plane => 3,
        }
    }
}

/// Indexed triangle mesh, counter-clockwise front faces
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn build(kind: MeshKind) -> Self {
        match kind {
            MeshKind::Sphere => Self::sphere(SPHERE_STACKS, SPHERE_SLICES),
            MeshKind::Cylinder => Self::cylinder(CYLINDER_SLICES),
            MeshKind::Box => Self::cube(),
            MeshKind::Plane => Self::plane(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        self.vertices.push(MeshVertex { position, normal });
        (self.vertices.len() - 1) as u32
    }

    /// UV sphere
    pub fn sphere(stacks: u32, slices: u32) -> Self {
        let mut mesh = Self::default();
        for i in 0..=stacks {
            let theta = PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let phi = TAU * j as f32 / slices as f32;
                let p = [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()];
                mesh.push(p, p);
            }
        }

        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }

    /// Capped cylinder along Z
    pub fn cylinder(slices: u32) -> Self {
        let mut mesh = Self::default();

        // side
        for j in 0..=slices {
            let phi = TAU * j as f32 / slices as f32;
            let (s, c) = phi.sin_cos();
            mesh.push([c, s, -1.0], [c, s, 0.0]);
            mesh.push([c, s, 1.0], [c, s, 0.0]);
        }
        for j in 0..slices {
            let a = 2 * j;
            mesh.indices.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
        }

        // caps
        for (z, normal) in [(1.0f32, 1.0f32), (-1.0, -1.0)] {
            let center = mesh.push([0.0, 0.0, z], [0.0, 0.0, normal]);
            let first = center + 1;
            for j in 0..=slices {
                let phi = TAU * j as f32 / slices as f32;
                mesh.push([phi.cos(), phi.sin(), z], [0.0, 0.0, normal]);
            }
            for j in 0..slices {
                let (a, b) = (first + j, first + j + 1);
                if normal > 0.0 {
                    mesh.indices.extend_from_slice(&[center, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[center, b, a]);
                }
            }
        }
        mesh
    }

    /// Cube with per-face normals
    pub fn cube() -> Self {
        let mut mesh = Self::default();
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u, v with u x v = normal
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];
        for (n, u, v) in faces {
            let corner = |su: f32, sv: f32| {
                [
                    n[0] + su * u[0] + sv * v[0],
                    n[1] + su * u[1] + sv * v[1],
                    n[2] + su * u[2] + sv * v[2],
                ]
            };
            let a = mesh.push(corner(-1.0, -1.0), n);
            let b = mesh.push(corner(1.0, -1.0), n);
            let c = mesh.push(corner(1.0, 1.0), n);
            let d = mesh.push(corner(-1.0, 1.0), n);
            mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
        mesh
    }

    /// Single-sided square facing +Z
    pub fn plane() -> Self {
        let mut mesh = Self::default();
        let n = [0.0, 0.0, 1.0];
        let a = mesh.push([-1.0, -1.0, 0.0], n);
        let b = mesh.push([1.0, -1.0, 0.0], n);
        let c = mesh.push([1.0, 1.0, 0.0], n);
        let d = mesh.push([-1.0, 1.0, 0.0], n);
        mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Every non-degenerate triangle must wind counter-clockwise seen from
    /// the side its vertex normals point to
    fn assert_outward_winding(mesh: &Mesh) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            let area = face.iter().map(|x| x * x).sum::<f32>();
            if area < 1e-10 {
                continue;
            }
            let n = a.normal;
            let dot = face[0] * n[0] + face[1] * n[1] + face[2] * n[2];
            assert!(dot > 0.0, "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn test_indices_in_range() {
        for kind in MeshKind::ALL {
            let mesh = Mesh::build(kind);
            assert_eq!(mesh.indices.len() % 3, 0);
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        }
    }

    #[test]
    fn test_sphere_vertices_on_unit_sphere() {
        let mesh = Mesh::sphere(8, 12);
        for v in &mesh.vertices {
            let r = v.position.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((r - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_winding() {
        assert_outward_winding(&Mesh::cube());
        assert_outward_winding(&Mesh::cylinder(8));
        assert_outward_winding(&Mesh::plane());
        assert_outward_winding(&Mesh::sphere(8, 12));
    }

    #[test]
    fn test_cube_counts() {
        let mesh = Mesh::cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_mesh_kind_index_is_dense() {
        for (i, kind) in MeshKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}

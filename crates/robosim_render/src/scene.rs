//! Renderable scene built from the model and simulation state
//!
//! The scene is a bounded list of primitive instances. It is rebuilt every
//! frame: each enabled geom contributes one or more [`SceneGeom`]s in world
//! space, followed by optional decorations.

use std::ops::Range;

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};
use robosim_model::{Geom, GeomKind, Model};
use robosim_physics::Data;

use crate::mesh::MeshKind;
use crate::options::{Category, VisOptions};
use crate::pipeline::GeomInstance;

/// Default maximum number of geoms in a scene
pub const DEFAULT_MAX_GEOMS: usize = 2000;

/// Half-size of planes declared without one, in model extents
const INFINITE_PLANE_EXTENTS: f32 = 4.0;
/// Checker cells across an automatically sized plane
const PLANE_CHECKS: f32 = 10.0;

/// A primitive instance in world space
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGeom {
    pub mesh: MeshKind,
    pub pose: Isometry3<f32>,
    /// Per-axis scale applied to the unit mesh
    pub scale: Vector3<f32>,
    pub color: [f32; 4],
    pub category: Category,
    /// Checker cell size, zero for a solid color
    pub checker: f32,
    /// Model geom this instance came from, `None` for decorations
    pub geom: Option<usize>,
}

impl SceneGeom {
    /// GPU instance data for this geom
    pub fn instance(&self) -> GeomInstance {
        let rotation: Matrix3<f32> = self.pose.rotation.to_rotation_matrix().into_inner();
        let t = self.pose.translation.vector;

        let mut model = [[0.0f32; 4]; 4];
        let mut normal = [[0.0f32; 4]; 3];
        for j in 0..3 {
            let axis = rotation.column(j);
            let s = self.scale[j];
            let inv = if s.abs() > f32::EPSILON { 1.0 / s } else { 1.0 };
            model[j] = [axis[0] * s, axis[1] * s, axis[2] * s, 0.0];
            normal[j] = [axis[0] * inv, axis[1] * inv, axis[2] * inv, 0.0];
        }
        model[3] = [t.x, t.y, t.z, 1.0];

        GeomInstance {
            model,
            normal,
            color: self.color,
            pattern: [self.checker, 0.0, 0.0, 0.0],
        }
    }
}

/// Instances sharing one mesh, drawn with a single call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub mesh: MeshKind,
    pub instances: Range<u32>,
}

/// Bounded list of renderable geoms
#[derive(Debug, Clone)]
pub struct Scene {
    geoms: Vec<SceneGeom>,
    capacity: usize,
    /// Geoms rejected during the last update
    dropped: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GEOMS)
    }
}

impl Scene {
    pub fn new(capacity: usize) -> Self {
        Self {
            geoms: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn geoms(&self) -> &[SceneGeom] {
        &self.geoms
    }

    pub fn len(&self) -> usize {
        self.geoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geoms.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of geoms that did not fit during the last update
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.geoms.clear();
        self.dropped = 0;
    }

    /// Add a geom. Returns false once the scene is full.
    pub fn push(&mut self, geom: SceneGeom) -> bool {
        if self.geoms.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.geoms.push(geom);
        true
    }

    /// Rebuild the scene from the current simulation state
    pub fn update(&mut self, model: &Model, data: &Data, options: &VisOptions) {
        self.clear();
        let extent = model.stat.extent;

        for (index, geom) in model.geoms.iter().enumerate() {
            let category = if model.is_welded_to_world(geom.body) {
                Category::STATIC
            } else {
                Category::DYNAMIC
            };
            if !options.categories.intersects(category) {
                continue;
            }
            let Some(pose) = data.geom_pose(index) else {
                continue;
            };

            let mut color = geom.rgba;
            if !options.transparency {
                color[3] = 1.0;
            }
            self.add_geom(index, geom, *pose, color, category, extent);
        }

        if options.world_frame && options.categories.contains(Category::DECOR) {
            self.add_world_frame(extent);
        }

        if self.dropped > 0 {
            log::warn!(
                "Scene full ({} geoms), {} not drawn",
                self.capacity,
                self.dropped
            );
        }
    }

    fn add_geom(
        &mut self,
        index: usize,
        geom: &Geom,
        pose: Isometry3<f32>,
        color: [f32; 4],
        category: Category,
        extent: f32,
    ) {
        let [a, b, c] = geom.size;
        let make = |mesh, pose, scale| SceneGeom {
            mesh,
            pose,
            scale,
            color,
            category,
            checker: 0.0,
            geom: Some(index),
        };

        match geom.kind {
            GeomKind::Sphere => {
                self.push(make(MeshKind::Sphere, pose, Vector3::repeat(a)));
            }
            GeomKind::Ellipsoid => {
                self.push(make(MeshKind::Sphere, pose, Vector3::new(a, b, c)));
            }
            GeomKind::Box => {
                self.push(make(MeshKind::Box, pose, Vector3::new(a, b, c)));
            }
            GeomKind::Cylinder => {
                self.push(make(MeshKind::Cylinder, pose, Vector3::new(a, a, b)));
            }
            GeomKind::Capsule => {
                self.push(make(MeshKind::Cylinder, pose, Vector3::new(a, a, b)));
                for end in [b, -b] {
                    let cap = pose * Translation3::new(0.0, 0.0, end);
                    self.push(make(MeshKind::Sphere, cap, Vector3::repeat(a)));
                }
            }
            GeomKind::Plane => {
                let auto = INFINITE_PLANE_EXTENTS * extent;
                let hx = if a > 0.0 { a } else { auto };
                let hy = if b > 0.0 { b } else { auto };
                let cell = if c > 0.0 { c } else { 2.0 * hx.min(hy) / PLANE_CHECKS };
                let mut plane = make(MeshKind::Plane, pose, Vector3::new(hx, hy, 1.0));
                plane.checker = cell;
                self.push(plane);
            }
        }
    }

    /// Three colored boxes along the world axes
    fn add_world_frame(&mut self, extent: f32) {
        let length = 0.5 * extent;
        let width = 0.01 * extent;
        let axes = [
            (Vector3::x(), [0.9, 0.1, 0.1, 1.0]),
            (Vector3::y(), [0.1, 0.9, 0.1, 1.0]),
            (Vector3::z(), [0.1, 0.1, 0.9, 1.0]),
        ];
        for (axis, color) in axes {
            let scale = Vector3::repeat(width) + axis * (0.5 * length - width);
            let pose = Isometry3::from_parts(
                Translation3::from(axis * (0.5 * length)),
                UnitQuaternion::identity(),
            );
            self.push(SceneGeom {
                mesh: MeshKind::Box,
                pose,
                scale,
                color,
                category: Category::DECOR,
                checker: 0.0,
                geom: None,
            });
        }
    }

    /// GPU instances grouped by mesh, with the draw range of each group
    pub fn batches(&self) -> (Vec<GeomInstance>, Vec<DrawBatch>) {
        let mut instances = Vec::with_capacity(self.geoms.len());
        let mut batches = Vec::new();

        for mesh in MeshKind::ALL {
            let start = instances.len() as u32;
            instances.extend(
                self.geoms
                    .iter()
                    .filter(|g| g.mesh == mesh)
                    .map(SceneGeom::instance),
            );
            let end = instances.len() as u32;
            if end > start {
                batches.push(DrawBatch {
                    mesh,
                    instances: start..end,
                });
            }
        }
        (instances, batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOT: &str = r#"
        <mujoco model="robot">
          <worldbody>
            <geom name="floor" type="plane" size="0 0 0.5"/>
            <geom name="post" type="box" size="0.1 0.1 0.5" pos="1 0 0.5"/>
            <body name="link" pos="0 0 1">
              <joint type="hinge" axis="0 1 0"/>
              <geom name="arm" type="capsule" fromto="0 0 0 0.4 0 0" size="0.05" rgba="1 0 0 0.5"/>
              <body name="hand" pos="0.4 0 0">
                <geom name="palm" type="ellipsoid" size="0.05 0.04 0.03"/>
              </body>
            </body>
          </worldbody>
        </mujoco>"#;

    fn setup() -> (Model, Data) {
        let model = Model::from_xml_str(ROBOT).unwrap();
        let data = Data::new(&model);
        (model, data)
    }

    #[test]
    fn test_capsule_expands_to_three_instances() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        scene.update(&model, &data, &VisOptions::default());

        let arm = model.geom_by_name("arm").unwrap();
        let parts: Vec<_> = scene.geoms().iter().filter(|g| g.geom == Some(arm)).collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].mesh, MeshKind::Cylinder);
        assert_eq!(parts[1].mesh, MeshKind::Sphere);
        assert_eq!(parts[2].mesh, MeshKind::Sphere);

        // end caps sit at the segment ends
        let ends: Vec<f32> = parts[1..].iter().map(|g| g.pose.translation.x).collect();
        assert!(ends.iter().any(|x| x.abs() < 1e-4));
        assert!(ends.iter().any(|x| (x - 0.4).abs() < 1e-4));
    }

    #[test]
    fn test_categories() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        scene.update(&model, &data, &VisOptions::default());

        let category_of = |name: &str| {
            let index = model.geom_by_name(name).unwrap();
            scene.geoms().iter().find(|g| g.geom == Some(index)).unwrap().category
        };
        assert_eq!(category_of("floor"), Category::STATIC);
        assert_eq!(category_of("post"), Category::STATIC);
        assert_eq!(category_of("arm"), Category::DYNAMIC);
        assert_eq!(category_of("palm"), Category::DYNAMIC);
    }

    #[test]
    fn test_category_filter() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        let opts = VisOptions::default().with_categories(Category::DYNAMIC);
        scene.update(&model, &data, &opts);
        assert!(scene.geoms().iter().all(|g| g.category == Category::DYNAMIC));
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_infinite_plane_sized_from_extent() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        scene.update(&model, &data, &VisOptions::default());
        let floor = model.geom_by_name("floor").unwrap();
        let plane = scene.geoms().iter().find(|g| g.geom == Some(floor)).unwrap();
        let half = 4.0 * model.stat.extent;
        assert!((plane.scale.x - half).abs() < 1e-5);
        assert!((plane.scale.y - half).abs() < 1e-5);
        assert_eq!(plane.checker, 0.5);
    }

    #[test]
    fn test_alpha_forced_opaque_unless_transparent() {
        let (model, data) = setup();
        let arm = model.geom_by_name("arm").unwrap();
        let mut scene = Scene::default();

        scene.update(&model, &data, &VisOptions::default());
        let alpha = scene.geoms().iter().find(|g| g.geom == Some(arm)).unwrap().color[3];
        assert_eq!(alpha, 1.0);

        scene.update(&model, &data, &VisOptions::default().with_transparency(true));
        let alpha = scene.geoms().iter().find(|g| g.geom == Some(arm)).unwrap().color[3];
        assert_eq!(alpha, 0.5);
    }

    #[test]
    fn test_world_frame_decor() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        let without = {
            scene.update(&model, &data, &VisOptions::default());
            scene.len()
        };
        scene.update(&model, &data, &VisOptions::default().with_world_frame(true));
        assert_eq!(scene.len(), without + 3);
        assert_eq!(
            scene.geoms().iter().filter(|g| g.category == Category::DECOR).count(),
            3
        );
    }

    #[test]
    fn test_capacity_limit() {
        let (model, data) = setup();
        let mut scene = Scene::new(2);
        scene.update(&model, &data, &VisOptions::default());
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.dropped(), 4);

        // a fresh update resets the overflow count
        let mut roomy = Scene::new(100);
        roomy.update(&model, &data, &VisOptions::default());
        assert_eq!(roomy.dropped(), 0);
        assert_eq!(roomy.len(), 6);
    }

    #[test]
    fn test_batches_group_by_mesh() {
        let (model, data) = setup();
        let mut scene = Scene::default();
        scene.update(&model, &data, &VisOptions::default());
        let (instances, batches) = scene.batches();

        assert_eq!(instances.len(), scene.len());
        let covered: u32 = batches.iter().map(|b| b.instances.end - b.instances.start).sum();
        assert_eq!(covered as usize, instances.len());
        let spheres = batches.iter().find(|b| b.mesh == MeshKind::Sphere).unwrap();
        // two capsule caps and the ellipsoid
        assert_eq!(spheres.instances.len(), 3);
    }

    #[test]
    fn test_instance_matrix_scales_and_translates() {
        let geom = SceneGeom {
            mesh: MeshKind::Box,
            pose: Isometry3::from_parts(Translation3::new(1.0, 2.0, 3.0), UnitQuaternion::identity()),
            scale: Vector3::new(2.0, 3.0, 4.0),
            color: [1.0; 4],
            category: Category::STATIC,
            checker: 0.0,
            geom: None,
        };
        let instance = geom.instance();
        assert_eq!(instance.model[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(instance.model[2], [0.0, 0.0, 4.0, 0.0]);
        assert_eq!(instance.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert!((instance.normal[1][1] - 1.0 / 3.0).abs() < 1e-6);
    }
}

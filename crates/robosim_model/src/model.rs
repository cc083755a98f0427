//! Model types
//!
//! A [`Model`] is the static description of a robot and its environment:
//! a tree of bodies (body 0 is the world), the joints that give bodies their
//! freedom relative to their parents, the collision/visual geoms attached to
//! bodies, lights, and global simulation options.

use std::path::Path;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::error::ModelError;
use crate::loader::ModelLoader;

/// Index of the world body
pub const WORLD_BODY: usize = 0;

/// Global simulation options
#[derive(Debug, Clone, PartialEq)]
pub struct SimOptions {
    /// Integration timestep in seconds
    pub timestep: f32,
    /// Gravity acceleration vector (Z is up)
    pub gravity: Vector3<f32>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            timestep: 0.002,
            gravity: Vector3::new(0.0, 0.0, -9.81),
        }
    }
}

/// A rigid body in the kinematic tree
#[derive(Debug, Clone)]
pub struct Body {
    pub name: Option<String>,
    /// Index of the parent body (the world body is its own parent)
    pub parent: usize,
    /// Position relative to the parent frame
    pub pos: Vector3<f32>,
    /// Orientation relative to the parent frame
    pub quat: UnitQuaternion<f32>,
    /// Explicit mass from `<inertial>`, if any
    pub mass: Option<f32>,
}

impl Body {
    /// The world body
    pub fn world() -> Self {
        Self {
            name: Some("world".to_string()),
            parent: WORLD_BODY,
            pos: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            mass: None,
        }
    }

    /// Pose of this body in its parent's frame
    pub fn local_pose(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.pos), self.quat)
    }
}

/// Joint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Six degrees of freedom, only on bodies whose parent is the world
    Free,
    /// Three rotational degrees of freedom
    Ball,
    /// One translational degree of freedom along `axis`
    Slide,
    /// One rotational degree of freedom about `axis`
    Hinge,
}

impl JointKind {
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        match name {
            "free" => Ok(JointKind::Free),
            "ball" => Ok(JointKind::Ball),
            "slide" => Ok(JointKind::Slide),
            "hinge" => Ok(JointKind::Hinge),
            other => Err(ModelError::UnknownType {
                kind: "joint",
                name: other.to_string(),
            }),
        }
    }
}

/// A joint between a body and its parent
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: Option<String>,
    pub kind: JointKind,
    /// The body this joint moves (relative to its parent)
    pub body: usize,
    /// Anchor position in the body frame
    pub pos: Vector3<f32>,
    /// Unit axis in the body frame (hinge and slide)
    pub axis: Vector3<f32>,
    /// Motion limits, radians for hinges and length units for slides
    pub range: Option<(f32, f32)>,
    /// Viscous damping coefficient
    pub damping: f32,
}

/// Geom shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeomKind {
    Plane,
    Sphere,
    Capsule,
    Ellipsoid,
    Cylinder,
    Box,
}

impl GeomKind {
    /// Parse a geom `type` attribute. Returns `Ok(None)` for types that exist
    /// in the format but are not supported here (meshes, height fields).
    pub fn parse(name: &str) -> Result<Option<Self>, ModelError> {
        match name {
            "plane" => Ok(Some(GeomKind::Plane)),
            "sphere" => Ok(Some(GeomKind::Sphere)),
            "capsule" => Ok(Some(GeomKind::Capsule)),
            "ellipsoid" => Ok(Some(GeomKind::Ellipsoid)),
            "cylinder" => Ok(Some(GeomKind::Cylinder)),
            "box" => Ok(Some(GeomKind::Box)),
            "mesh" | "hfield" | "sdf" => Ok(None),
            other => Err(ModelError::UnknownType {
                kind: "geom",
                name: other.to_string(),
            }),
        }
    }

    /// Number of leading `size` components the shape needs
    pub fn required_sizes(self) -> usize {
        match self {
            GeomKind::Plane => 0,
            GeomKind::Sphere => 1,
            GeomKind::Capsule | GeomKind::Cylinder => 2,
            GeomKind::Ellipsoid | GeomKind::Box => 3,
        }
    }
}

/// Contact rule for two `(contype, conaffinity)` pairs: either geom's type
/// bits must overlap the other geom's affinity bits.
pub fn contact_masks_match(a: (u32, u32), b: (u32, u32)) -> bool {
    (a.0 & b.1) != 0 || (b.0 & a.1) != 0
}

/// A geometric primitive attached to a body
#[derive(Debug, Clone)]
pub struct Geom {
    pub name: Option<String>,
    pub kind: GeomKind,
    pub body: usize,
    /// Position in the body frame
    pub pos: Vector3<f32>,
    /// Orientation in the body frame
    pub quat: UnitQuaternion<f32>,
    /// Shape parameters: radius / half-lengths, see [`GeomKind`]
    pub size: [f32; 3],
    pub rgba: [f32; 4],
    pub friction: f32,
    pub density: f32,
    /// Explicit mass, overrides density
    pub mass: Option<f32>,
    pub contype: u32,
    pub conaffinity: u32,
}

impl Geom {
    /// Pose of this geom in its body's frame
    pub fn local_pose(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.pos), self.quat)
    }

    /// Whether this geom takes part in collisions at all
    pub fn collides(&self) -> bool {
        self.contype != 0 || self.conaffinity != 0
    }

    /// Whether contacts between this geom and `other` are generated
    pub fn collides_with(&self, other: &Geom) -> bool {
        contact_masks_match(
            (self.contype, self.conaffinity),
            (other.contype, other.conaffinity),
        )
    }

    /// Radius of a sphere around the geom origin that contains the shape.
    /// Infinite planes report zero.
    pub fn bounding_radius(&self) -> f32 {
        let [a, b, c] = self.size;
        match self.kind {
            GeomKind::Plane => 0.0,
            GeomKind::Sphere => a,
            GeomKind::Capsule => a + b,
            GeomKind::Cylinder => (a * a + b * b).sqrt(),
            GeomKind::Ellipsoid => a.max(b).max(c),
            GeomKind::Box => (a * a + b * b + c * c).sqrt(),
        }
    }
}

/// A light source
#[derive(Debug, Clone)]
pub struct Light {
    pub pos: Vector3<f32>,
    /// Unit direction the light points in
    pub dir: Vector3<f32>,
    pub directional: bool,
    pub diffuse: [f32; 3],
}

/// Model statistics used to scale visualization
#[derive(Debug, Clone, PartialEq)]
pub struct Statistic {
    /// Center of the model's bounding box at the initial configuration
    pub center: Point3<f32>,
    /// Characteristic size of the model
    pub extent: f32,
}

impl Default for Statistic {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            extent: 1.0,
        }
    }
}

/// Static description of bodies, joints, and geometry
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub options: SimOptions,
    pub bodies: Vec<Body>,
    pub joints: Vec<Joint>,
    pub geoms: Vec<Geom>,
    pub lights: Vec<Light>,
    pub stat: Statistic,
}

impl Model {
    /// An empty model containing only the world body
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: SimOptions::default(),
            bodies: vec![Body::world()],
            joints: Vec::new(),
            geoms: Vec::new(),
            lights: Vec::new(),
            stat: Statistic::default(),
        }
    }

    /// Load a model from an MJCF file. Includes resolve relative to the file.
    pub fn from_xml_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let model = ModelLoader::new().load_file(path.as_ref())?;
        log::info!(
            "Loaded model '{}': {} bodies, {} joints, {} geoms",
            model.name,
            model.bodies.len(),
            model.joints.len(),
            model.geoms.len()
        );
        Ok(model)
    }

    /// Load a model from an MJCF string. Includes resolve relative to the
    /// current directory.
    pub fn from_xml_str(xml: &str) -> Result<Self, ModelError> {
        ModelLoader::new().load_str(xml)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn geom_count(&self) -> usize {
        self.geoms.len()
    }

    /// Find a body index by name
    pub fn body_by_name(&self, name: &str) -> Option<usize> {
        self.bodies
            .iter()
            .position(|b| b.name.as_deref() == Some(name))
    }

    /// Find a geom index by name
    pub fn geom_by_name(&self, name: &str) -> Option<usize> {
        self.geoms
            .iter()
            .position(|g| g.name.as_deref() == Some(name))
    }

    /// Joints attached to `body`, in file order
    pub fn body_joints(&self, body: usize) -> impl Iterator<Item = &Joint> + '_ {
        self.joints.iter().filter(move |j| j.body == body)
    }

    /// True when `body` cannot move relative to the world: it is the world
    /// itself or every body on its path to the world has no joints.
    pub fn is_welded_to_world(&self, body: usize) -> bool {
        let mut current = body;
        while current != WORLD_BODY {
            if self.body_joints(current).next().is_some() {
                return false;
            }
            current = self.bodies[current].parent;
        }
        true
    }

    /// World poses of all bodies at the initial configuration.
    ///
    /// Bodies are stored parent-before-child, so a single forward pass works.
    pub fn body_world_poses(&self) -> Vec<Isometry3<f32>> {
        let mut poses: Vec<Isometry3<f32>> = Vec::with_capacity(self.bodies.len());
        for (i, body) in self.bodies.iter().enumerate() {
            if i == WORLD_BODY {
                poses.push(Isometry3::identity());
            } else {
                poses.push(poses[body.parent] * body.local_pose());
            }
        }
        poses
    }

    /// Recompute [`Statistic`] from the geoms at the initial configuration
    pub fn compute_statistic(&mut self) {
        let poses = self.body_world_poses();
        let mut min = Vector3::repeat(f32::INFINITY);
        let mut max = Vector3::repeat(f32::NEG_INFINITY);
        let mut any = false;

        for geom in self.geoms.iter().filter(|g| g.kind != GeomKind::Plane) {
            let center = poses[geom.body] * Point3::from(geom.pos);
            let r = Vector3::repeat(geom.bounding_radius());
            min = min.inf(&(center.coords - r));
            max = max.sup(&(center.coords + r));
            any = true;
        }

        self.stat = if any {
            let size = max - min;
            Statistic {
                center: Point3::from((min + max) * 0.5),
                extent: size.max().max(1e-3),
            }
        } else {
            Statistic::default()
        };
    }
}

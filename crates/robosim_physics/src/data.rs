//! Simulation state for a model
//!
//! [`Data`] owns the Rapier world built from a [`Model`]. Every body that has
//! a joint becomes its own rigid body; bodies without joints are welded to
//! their parent's rigid body at a fixed offset. A body with several joints is
//! reached through a chain of light intermediate rigid bodies, one per extra
//! joint. The world body is a fixed rigid body at the origin.

use num_traits::Zero;
use std::collections::HashMap;

use nalgebra::{Isometry3, Point3, Vector3};
use rapier3d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};
use rapier3d::prelude::MassProperties;
use robosim_model::{Model, WORLD_BODY};

use crate::contacts::ContactFilter;
use crate::joints::model_joint_to_rapier;
use crate::shapes::geom_collider;

/// Mass given to dynamic bodies that declare no mass and carry no geoms
pub const FALLBACK_MASS: f32 = 1e-3;

/// Where a model body lives in the Rapier world
#[derive(Debug, Clone, Copy)]
struct BodyLink {
    handle: RigidBodyHandle,
    /// Pose of the model body in the rigid body's frame
    offset: Isometry3<f32>,
}

/// Mutable simulation state: time, body poses, and the physics world
pub struct Data {
    time: f64,
    steps: u64,
    gravity: Vector3<f32>,

    pipeline: PhysicsPipeline,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    links: Vec<BodyLink>,
    /// (body index, pose in body frame) for each geom
    geom_frames: Vec<(usize, Isometry3<f32>)>,
    body_poses: Vec<Isometry3<f32>>,
    geom_poses: Vec<Isometry3<f32>>,
}

impl Data {
    /// Build the simulation state for `model` at its initial configuration
    pub fn new(model: &Model) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = model.options.timestep;

        let mut data = Self {
            time: 0.0,
            steps: 0,
            gravity: model.options.gravity,
            pipeline: PhysicsPipeline::new(),
            integration_params,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            links: Vec::with_capacity(model.body_count()),
            geom_frames: model.geoms.iter().map(|g| (g.body, g.local_pose())).collect(),
            body_poses: Vec::new(),
            geom_poses: Vec::new(),
        };

        data.build_bodies(model);
        data.build_colliders(model);
        data.refresh_poses();
        data.query_pipeline.update(&data.colliders);

        log::debug!(
            "Physics world: {} rigid bodies, {} colliders, {} joints",
            data.bodies.len(),
            data.colliders.len(),
            data.impulse_joints.len()
        );
        data
    }

    fn build_bodies(&mut self, model: &Model) {
        let initial = model.body_world_poses();

        for (index, body) in model.bodies.iter().enumerate() {
            if index == WORLD_BODY {
                let handle = self
                    .bodies
                    .insert(RigidBodyBuilder::fixed().position(Isometry3::identity()).build());
                self.links.push(BodyLink {
                    handle,
                    offset: Isometry3::identity(),
                });
                continue;
            }

            let joints: Vec<_> = model.body_joints(index).collect();
            if joints.is_empty() {
                let parent = self.links[body.parent];
                self.links.push(BodyLink {
                    handle: parent.handle,
                    offset: parent.offset * body.local_pose(),
                });
                continue;
            }

            // Joints act in series: each one but the last drives a light
            // intermediate body that shares the body's initial pose.
            let pose = initial[index];
            let mut parent_handle = self.links[body.parent].handle;
            for (position, joint) in joints.iter().enumerate() {
                let mut builder = RigidBodyBuilder::dynamic().position(pose);
                if position + 1 < joints.len() {
                    builder = builder
                        .additional_mass_properties(point_mass(FALLBACK_MASS, Point3::origin()));
                }
                let handle = self.bodies.insert(builder.build());

                let parent_pose = *self.bodies[parent_handle].position();
                if let Some(generic) = model_joint_to_rapier(joint, &parent_pose, &pose) {
                    self.impulse_joints.insert(parent_handle, handle, generic, true);
                }
                parent_handle = handle;
            }
            self.links.push(BodyLink {
                handle: parent_handle,
                offset: Isometry3::identity(),
            });
        }
    }

    fn build_colliders(&mut self, model: &Model) {
        let mut geoms_per_body = vec![0usize; model.body_count()];
        for geom in &model.geoms {
            geoms_per_body[geom.body] += 1;
        }

        for geom in &model.geoms {
            let link = self.links[geom.body];
            let share = model.bodies[geom.body]
                .mass
                .map(|mass| mass / geoms_per_body[geom.body] as f32);
            let collider = geom_collider(geom, link.offset * geom.local_pose(), share);
            self.colliders
                .insert_with_parent(collider, link.handle, &mut self.bodies);
        }

        // Mass sources per rigid body: geoms, or an explicit mass on a geomless
        // body placed at that body's origin
        let mut extra_mass: HashMap<RigidBodyHandle, MassProperties> = HashMap::new();
        let mut has_mass: HashMap<RigidBodyHandle, bool> = HashMap::new();
        for geom in &model.geoms {
            has_mass.insert(self.links[geom.body].handle, true);
        }
        for (index, body) in model.bodies.iter().enumerate() {
            if let (Some(mass), 0) = (body.mass, geoms_per_body[index]) {
                let link = self.links[index];
                let center = Point3::from(link.offset.translation.vector);
                let total = extra_mass.entry(link.handle).or_insert_with(MassProperties::zero);
                *total = *total + point_mass(mass, center);
                has_mass.insert(link.handle, true);
            }
        }

        for (index, link) in self.links.iter().enumerate() {
            // only bodies that own their rigid body
            if index == WORLD_BODY || model.body_joints(index).next().is_none() {
                continue;
            }
            let Some(rigid_body) = self.bodies.get_mut(link.handle) else {
                continue;
            };
            if !rigid_body.is_dynamic() {
                continue;
            }
            let mass_properties = match extra_mass.get(&link.handle) {
                Some(mass_properties) => *mass_properties,
                None if has_mass.contains_key(&link.handle) => continue,
                None => {
                    log::warn!(
                        "Body {} has no mass source; using {} kg",
                        model.bodies[index].name.as_deref().unwrap_or("<unnamed>"),
                        FALLBACK_MASS
                    );
                    point_mass(FALLBACK_MASS, Point3::origin())
                }
            };
            rigid_body.set_additional_mass_properties(mass_properties, true);
        }
    }

    fn refresh_poses(&mut self) {
        self.body_poses = self
            .links
            .iter()
            .map(|link| self.bodies[link.handle].position() * link.offset)
            .collect();
        self.geom_poses = self
            .geom_frames
            .iter()
            .map(|(body, local)| self.body_poses[*body] * local)
            .collect();
    }

    /// Advance the simulation by one timestep
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &ContactFilter,
            &(),
        );
        self.time += f64::from(self.integration_params.dt);
        self.steps += 1;
        self.refresh_poses();
    }

    /// Return to the model's initial configuration with time zero
    pub fn reset(&mut self, model: &Model) {
        *self = Self::new(model);
        log::info!("Simulation reset");
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of steps taken since creation or the last reset
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// World pose of body `index`
    pub fn body_pose(&self, index: usize) -> Option<&Isometry3<f32>> {
        self.body_poses.get(index)
    }

    pub fn body_poses(&self) -> &[Isometry3<f32>] {
        &self.body_poses
    }

    /// World pose of geom `index`
    pub fn geom_pose(&self, index: usize) -> Option<&Isometry3<f32>> {
        self.geom_poses.get(index)
    }

    pub fn geom_poses(&self) -> &[Isometry3<f32>] {
        &self.geom_poses
    }

    /// Linear velocity of the origin of body `index`
    pub fn body_linear_velocity(&self, index: usize) -> Option<Vector3<f32>> {
        let link = self.links.get(index)?;
        let origin = Point3::from(self.body_poses[index].translation.vector);
        Some(self.bodies[link.handle].velocity_at_point(&origin))
    }
}

/// Mass properties of a small solid sphere of the given mass centered at
/// `center` in the rigid body's frame
fn point_mass(mass: f32, center: Point3<f32>) -> MassProperties {
    // inertia of a 5 cm radius solid sphere
    let inertia = 0.4 * mass * 0.05 * 0.05;
    MassProperties::new(center, mass, Vector3::repeat(inertia))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLING_BALL: &str = r#"
        <mujoco model="ball">
          <option timestep="0.002"/>
          <worldbody>
            <body name="ball" pos="0 0 2">
              <freejoint/>
              <geom type="sphere" size="0.1"/>
            </body>
          </worldbody>
        </mujoco>"#;

    const BALL_ON_FLOOR: &str = r#"
        <mujoco model="rest">
          <worldbody>
            <geom name="floor" type="plane" size="5 5 0.1"/>
            <body name="ball" pos="0 0 0.3">
              <freejoint/>
              <geom type="sphere" size="0.1"/>
            </body>
          </worldbody>
        </mujoco>"#;

    const PENDULUM: &str = r#"
        <mujoco model="pendulum">
          <worldbody>
            <body name="arm" pos="0 0 1">
              <joint name="swing" type="hinge" axis="0 1 0"/>
              <geom type="capsule" fromto="0 0 0 0.5 0 0" size="0.02"/>
              <body name="tip" pos="0.5 0 0">
                <geom name="tip_geom" type="sphere" size="0.05"/>
              </body>
            </body>
          </worldbody>
        </mujoco>"#;

    fn load(xml: &str) -> Model {
        Model::from_xml_str(xml).unwrap()
    }

    #[test]
    fn test_time_advances_by_timestep() {
        let model = load(FALLING_BALL);
        let mut data = Data::new(&model);
        for _ in 0..10 {
            data.step();
        }
        assert_eq!(data.step_count(), 10);
        assert!((data.time() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_free_body_falls() {
        let model = load(FALLING_BALL);
        let ball = model.body_by_name("ball").unwrap();
        let mut data = Data::new(&model);
        let start = data.body_pose(ball).unwrap().translation.z;
        for _ in 0..100 {
            data.step();
        }
        let end = data.body_pose(ball).unwrap().translation.z;
        assert!(end < start - 0.1);
        assert!(data.body_linear_velocity(ball).unwrap().z < 0.0);
    }

    #[test]
    fn test_body_rests_on_plane() {
        let model = load(BALL_ON_FLOOR);
        let ball = model.body_by_name("ball").unwrap();
        let mut data = Data::new(&model);
        for _ in 0..1500 {
            data.step();
        }
        let z = data.body_pose(ball).unwrap().translation.z;
        assert!(z > 0.05 && z < 0.15, "ball settled at z = {z}");
    }

    #[test]
    fn test_pendulum_keeps_length() {
        let model = load(PENDULUM);
        let arm = model.body_by_name("arm").unwrap();
        let tip = model.body_by_name("tip").unwrap();
        let mut data = Data::new(&model);
        for _ in 0..300 {
            data.step();
        }
        let pivot = data.body_pose(arm).unwrap().translation.vector;
        let end = data.body_pose(tip).unwrap().translation.vector;
        assert!((pivot - Vector3::new(0.0, 0.0, 1.0)).norm() < 0.02);
        assert!(((end - pivot).norm() - 0.5).abs() < 0.02);
        // gravity swings the tip down from horizontal
        assert!(end.z < 0.99);
    }

    #[test]
    fn test_welded_geom_follows_body() {
        let model = load(PENDULUM);
        let tip = model.body_by_name("tip").unwrap();
        let tip_geom = model.geom_by_name("tip_geom").unwrap();
        let mut data = Data::new(&model);
        for _ in 0..50 {
            data.step();
        }
        let body = data.body_pose(tip).unwrap().translation.vector;
        let geom = data.geom_pose(tip_geom).unwrap().translation.vector;
        assert!((body - geom).norm() < 1e-5);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let model = load(FALLING_BALL);
        let ball = model.body_by_name("ball").unwrap();
        let mut data = Data::new(&model);
        for _ in 0..50 {
            data.step();
        }
        data.reset(&model);
        assert_eq!(data.time(), 0.0);
        assert_eq!(data.step_count(), 0);
        assert!((data.body_pose(ball).unwrap().translation.z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_geoms_stay_put() {
        let model = load(BALL_ON_FLOOR);
        let floor = model.geom_by_name("floor").unwrap();
        let mut data = Data::new(&model);
        for _ in 0..20 {
            data.step();
        }
        assert_eq!(*data.geom_pose(floor).unwrap(), Isometry3::identity());
    }

    #[test]
    fn test_out_of_range_queries() {
        let model = load(FALLING_BALL);
        let data = Data::new(&model);
        assert!(data.body_pose(99).is_none());
        assert!(data.geom_pose(99).is_none());
        assert!(data.body_linear_velocity(99).is_none());
        assert_eq!(data.body_poses().len(), model.body_count());
        assert_eq!(data.geom_poses().len(), model.geom_count());
    }
}

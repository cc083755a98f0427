//! Joint conversion from model joints to Rapier.

use std::f32::consts::PI;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rapier3d::dynamics::{GenericJoint, GenericJointBuilder, JointAxesMask, JointAxis, MotorModel};
use robosim_model::{Joint, JointKind};

/// Create a Rapier joint between a parent and a child rigid body.
///
/// Both joint frames coincide in world space at the initial poses, so hinge
/// and slide ranges are measured from the starting configuration.
///
/// # Arguments
///
/// * `joint` - The model joint (anchor and axis in the child body frame)
/// * `parent_pose` - World pose of the parent rigid body
/// * `child_pose` - World pose of the child rigid body
///
/// # Returns
///
/// `None` for free joints, which need no constraint.
pub fn model_joint_to_rapier(
    joint: &Joint,
    parent_pose: &Isometry3<f32>,
    child_pose: &Isometry3<f32>,
) -> Option<GenericJoint> {
    let child_frame = joint_frame(joint);
    let parent_frame = parent_pose.inverse() * child_pose * child_frame;

    let locked = match joint.kind {
        JointKind::Free => return None,
        JointKind::Ball => JointAxesMask::LOCKED_SPHERICAL_AXES,
        JointKind::Hinge => JointAxesMask::LOCKED_REVOLUTE_AXES,
        JointKind::Slide => JointAxesMask::LOCKED_PRISMATIC_AXES,
    };

    let mut builder = GenericJointBuilder::new(locked)
        .local_frame1(parent_frame)
        .local_frame2(child_frame)
        .contacts_enabled(false);

    let free_axis = match joint.kind {
        JointKind::Hinge => JointAxis::AngX,
        JointKind::Slide => JointAxis::LinX,
        _ => return Some(builder.build()),
    };

    if let Some((lower, upper)) = joint.range {
        builder = builder.limits(free_axis, [lower, upper]);
    }

    // Viscous damping as a zero-velocity motor
    if joint.damping > 0.0 {
        builder = builder
            .motor_model(free_axis, MotorModel::ForceBased)
            .motor_velocity(free_axis, 0.0, joint.damping);
    }

    Some(builder.build())
}

/// Joint frame in the child body: origin at the anchor, +X along the axis
fn joint_frame(joint: &Joint) -> Isometry3<f32> {
    let axis = joint.axis.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x);
    let rotation = UnitQuaternion::rotation_between(&Vector3::x(), &axis)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI));
    Isometry3::from_parts(Translation3::from(joint.pos), rotation)
}

//! Collision shapes for model geoms

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use rapier3d::geometry::{Collider, ColliderBuilder, InteractionGroups, SharedShape};
use rapier3d::pipeline::ActiveHooks;
use robosim_model::{Geom, GeomKind};

use crate::contacts::pack_masks;

/// Latitude/longitude resolution of the ellipsoid hull
const ELLIPSOID_SEGMENTS: usize = 12;

/// Build the collider for a geom.
///
/// `local` is the geom pose relative to the rigid body the collider is
/// attached to. `mass_share` overrides the geom's own density when its body
/// declares an explicit mass.
pub fn geom_collider(geom: &Geom, local: Isometry3<f32>, mass_share: Option<f32>) -> Collider {
    let (shape, correction) = geom_shape(geom);

    let mut builder = ColliderBuilder::new(shape)
        .position(local * correction)
        .friction(geom.friction)
        .user_data(pack_masks(geom))
        .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS);

    builder = match (geom.mass, mass_share) {
        (Some(mass), _) | (None, Some(mass)) => builder.mass(mass),
        (None, None) => builder.density(geom.density),
    };

    if !geom.collides() {
        builder = builder.collision_groups(InteractionGroups::none());
    }

    builder.build()
}

/// Shape for a geom plus the rotation that aligns the shape's native axis
/// with the geom's local Z axis.
pub fn geom_shape(geom: &Geom) -> (SharedShape, Isometry3<f32>) {
    let [a, b, c] = geom.size;
    match geom.kind {
        GeomKind::Plane => (SharedShape::halfspace(Vector3::z_axis()), Isometry3::identity()),
        GeomKind::Sphere => (SharedShape::ball(a), Isometry3::identity()),
        GeomKind::Capsule => (SharedShape::capsule_z(b, a), Isometry3::identity()),
        // rapier cylinders run along Y
        GeomKind::Cylinder => (
            SharedShape::cylinder(b, a),
            Isometry3::from_parts(
                Vector3::zeros().into(),
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::FRAC_PI_2),
            ),
        ),
        GeomKind::Box => (SharedShape::cuboid(a, b, c), Isometry3::identity()),
        GeomKind::Ellipsoid => {
            let points = ellipsoid_points([a, b, c], ELLIPSOID_SEGMENTS);
            let shape = SharedShape::convex_hull(&points).unwrap_or_else(|| {
                log::warn!("Ellipsoid hull failed, using bounding sphere");
                SharedShape::ball(a.max(b).max(c))
            });
            (shape, Isometry3::identity())
        }
    }
}

/// Sample points on an ellipsoid surface
pub fn ellipsoid_points(radii: [f32; 3], segments: usize) -> Vec<Point3<f32>> {
    let mut points = Vec::with_capacity((segments + 1) * segments);
    for i in 0..=segments {
        let theta = std::f32::consts::PI * i as f32 / segments as f32;
        for j in 0..segments {
            let phi = std::f32::consts::TAU * j as f32 / segments as f32;
            points.push(Point3::new(
                radii[0] * theta.sin() * phi.cos(),
                radii[1] * theta.sin() * phi.sin(),
                radii[2] * theta.cos(),
            ));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::unpack_masks;

    fn geom(kind: GeomKind, size: [f32; 3]) -> Geom {
        Geom {
            name: None,
            kind,
            body: 0,
            pos: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            size,
            rgba: [1.0; 4],
            friction: 0.8,
            density: 1000.0,
            mass: None,
            contype: 1,
            conaffinity: 1,
        }
    }

    #[test]
    fn test_cylinder_correction_maps_y_to_z() {
        let (_, correction) = geom_shape(&geom(GeomKind::Cylinder, [0.1, 0.5, 0.0]));
        let axis = correction * Vector3::y();
        assert!((axis - Vector3::z()).norm() < 1e-5);
    }

    #[test]
    fn test_ellipsoid_points_on_surface() {
        let radii = [1.0, 2.0, 3.0];
        for p in ellipsoid_points(radii, 8) {
            let v = (p.x / radii[0]).powi(2) + (p.y / radii[1]).powi(2) + (p.z / radii[2]).powi(2);
            assert!((v - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_collider_friction_and_mass() {
        let g = geom(GeomKind::Sphere, [0.1, 0.0, 0.0]);
        let collider = geom_collider(&g, Isometry3::identity(), Some(2.0));
        assert!((collider.friction() - 0.8).abs() < 1e-6);
        assert!((collider.mass() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_non_colliding_geom_groups() {
        let mut g = geom(GeomKind::Box, [0.1, 0.1, 0.1]);
        g.contype = 0;
        g.conaffinity = 0;
        let collider = geom_collider(&g, Isometry3::identity(), None);
        assert_eq!(collider.collision_groups(), InteractionGroups::none());
    }

    #[test]
    fn test_collider_carries_contact_masks() {
        let mut g = geom(GeomKind::Sphere, [0.1, 0.0, 0.0]);
        g.contype = 1;
        g.conaffinity = 0;
        let collider = geom_collider(&g, Isometry3::identity(), None);
        assert_eq!(unpack_masks(collider.user_data), (1, 0));
        assert!(collider.active_hooks().contains(ActiveHooks::FILTER_CONTACT_PAIRS));
    }
}

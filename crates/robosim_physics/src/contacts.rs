//! Contact filtering by geom contype/conaffinity masks
//!
//! Rapier's collision groups require both colliders to accept each other,
//! while model geoms collide when either side's type bits meet the other's
//! affinity bits. Each collider stores its geom's masks in `user_data` and
//! [`ContactFilter`] applies the pair rule during the narrow phase.

use rapier3d::geometry::{Collider, SolverFlags};
use rapier3d::pipeline::{PairFilterContext, PhysicsHooks};
use robosim_model::{contact_masks_match, Geom};

/// Pack a geom's `(contype, conaffinity)` into collider user data
pub fn pack_masks(geom: &Geom) -> u128 {
    u128::from(geom.contype) | (u128::from(geom.conaffinity) << 32)
}

/// Inverse of [`pack_masks`]
pub fn unpack_masks(user_data: u128) -> (u32, u32) {
    (user_data as u32, (user_data >> 32) as u32)
}

/// Whether the geom masks carried by two colliders allow contact
pub fn colliders_match(a: &Collider, b: &Collider) -> bool {
    contact_masks_match(unpack_masks(a.user_data), unpack_masks(b.user_data))
}

/// Physics hooks that drop contact pairs rejected by the geom masks
#[derive(Debug, Default, Clone, Copy)]
pub struct ContactFilter;

impl PhysicsHooks for ContactFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let a = context.colliders.get(context.collider1)?;
        let b = context.colliders.get(context.collider2)?;
        colliders_match(a, b).then_some(SolverFlags::COMPUTE_IMPULSES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::geometry::ColliderBuilder;

    fn collider(contype: u32, conaffinity: u32) -> Collider {
        let masks = u128::from(contype) | (u128::from(conaffinity) << 32);
        ColliderBuilder::ball(0.1).user_data(masks).build()
    }

    #[test]
    fn test_masks_survive_packing() {
        let packed = u128::from(0xdead_beef_u32) | (u128::from(7u32) << 32);
        assert_eq!(unpack_masks(packed), (0xdead_beef, 7));
    }

    #[test]
    fn test_type_only_pair_is_filtered() {
        assert!(!colliders_match(&collider(1, 0), &collider(1, 0)));
        assert!(colliders_match(&collider(1, 0), &collider(0, 1)));
        assert!(colliders_match(&collider(1, 1), &collider(1, 1)));
        assert!(!colliders_match(&collider(2, 2), &collider(1, 1)));
    }
}

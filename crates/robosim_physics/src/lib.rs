//! Physics simulation for robosim models
//!
//! This crate steps a [`robosim_model::Model`] forward in time using Rapier:
//! - Geom shapes become colliders
//! - Hinge, slide and ball joints become impulse joints
//! - Contacts follow the geoms' contype/conaffinity pair rule
//! - [`Data`] holds the time and world poses of bodies and geoms

pub mod contacts;
pub mod data;
pub mod joints;
pub mod shapes;

pub use contacts::ContactFilter;
pub use data::{Data, FALLBACK_MASS};
pub use joints::model_joint_to_rapier;
pub use shapes::{geom_collider, geom_shape};

//! Robot model loading for robosim
//!
//! This crate reads robot descriptions written in a subset of the MJCF XML
//! format and turns them into a [`Model`]:
//!
//! - [`Model`] - bodies, joints, geoms, lights and simulation options
//! - [`ModelError`] - diagnostics for unreadable or invalid files
//!
//! ```ignore
//! let model = robosim_model::Model::from_xml_file("models/arm_scene.xml")?;
//! println!("{} bodies", model.body_count());
//! ```

mod attributes;
mod defaults;
mod error;
mod loader;
mod model;

pub use attributes::AngleUnit;
pub use error::ModelError;
pub use model::{
    contact_masks_match, Body, Geom, GeomKind, Joint, JointKind, Light, Model, SimOptions,
    Statistic, WORLD_BODY,
};

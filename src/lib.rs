//! robosim - robot model viewer and simulator
//!
//! Library half of the `robosim` binary: configuration, key mapping, and the
//! window, simulation, and render systems the application loop drives.

pub mod config;
pub mod input;
pub mod systems;

//! Simulation system
//!
//! Owns the model and its simulation state and advances it once per frame:
//! - Fixed number of physics steps per frame
//! - Pause and reset
//! - Frame pacing sleep

use std::path::Path;
use std::time::Duration;
use robosim_model::{Model, ModelError};
use robosim_physics::Data;
use crate::config::SimulationConfig;

/// Manages the physics model and data
pub struct SimulationSystem {
    model: Model,
    data: Data,
    paused: bool,
    steps_per_frame: u32,
    frame_sleep: Duration,
}

impl SimulationSystem {
    /// Create a simulation for an already loaded model
    pub fn new(model: Model, config: &SimulationConfig) -> Self {
        let data = Data::new(&model);
        Self {
            model,
            data,
            paused: config.start_paused,
            steps_per_frame: config.steps_per_frame.max(1),
            frame_sleep: Duration::from_millis(config.frame_sleep_ms),
        }
    }

    /// Load a model file and create its simulation
    pub fn load<P: AsRef<Path>>(path: P, config: &SimulationConfig) -> Result<Self, ModelError> {
        let model = Model::from_xml_file(path)?;
        Ok(Self::new(model, config))
    }

    /// Run one frame of simulation
    ///
    /// Returns the number of physics steps taken (zero while paused).
    pub fn update(&mut self) -> u32 {
        if self.paused {
            return 0;
        }
        for _ in 0..self.steps_per_frame {
            self.data.step();
        }
        self.steps_per_frame
    }

    /// Return to the initial configuration
    pub fn reset(&mut self) {
        self.data.reset(&self.model);
    }

    /// Pause or resume; returns true when now paused
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        log::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.data.time()
    }

    /// Block for the configured frame sleep
    pub fn pace(&self) {
        if !self.frame_sleep.is_zero() {
            std::thread::sleep(self.frame_sleep);
        }
    }
}

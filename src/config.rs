//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`ROBOSIM_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Model file configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Simulation loop configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`ROBOSIM_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // ROBOSIM_MODEL__PATH=models/other.xml -> model.path = "models/other.xml"
        figment = figment.merge(Env::prefixed("ROBOSIM_").split("__"));

        Ok(figment.extract()?)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Robot Simulation".to_string(),
            width: 1200,
            height: 900,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Model file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the MJCF model file
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/arm_scene.xml".to_string(),
        }
    }
}

/// Simulation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics steps taken per rendered frame
    pub steps_per_frame: u32,
    /// Sleep after each frame in milliseconds
    pub frame_sleep_ms: u64,
    /// Start with the simulation paused
    pub start_paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps_per_frame: 1,
            frame_sleep_ms: 1,
            start_paused: false,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fovy: f32,
    /// Initial azimuth in degrees
    pub azimuth: f32,
    /// Initial elevation in degrees (negative looks down)
    pub elevation: f32,
    /// Initial distance as a multiple of the model extent
    pub distance_scale: f32,
    /// Zoom per scroll line
    pub scroll_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            azimuth: 90.0,
            elevation: -45.0,
            distance_scale: 1.5,
            scroll_sensitivity: 0.05,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Maximum geoms in the scene
    pub max_geoms: usize,
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
    /// Light direction [x, y, z], used when the model declares no directional light
    pub light_dir: [f32; 3],
    /// Ambient light strength
    pub ambient_strength: f32,
    /// Diffuse light strength
    pub diffuse_strength: f32,
    /// Specular highlight strength
    pub specular_strength: f32,
    /// Honor geom alpha
    pub transparency: bool,
    /// Draw the world coordinate axes
    pub world_frame: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            max_geoms: 2000,
            background_color: [0.15, 0.2, 0.25, 1.0],
            light_dir: [-0.3, 0.4, -1.0],
            ambient_strength: 0.3,
            diffuse_strength: 0.7,
            specular_strength: 0.2,
            transparency: false,
            world_frame: false,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Default log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    pub log_level: String,
    /// Show simulation time in the window title
    pub show_sim_time: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_sim_time: true,
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(#[from] Box<figment::Error>);

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.window.height, 900);
        assert_eq!(config.model.path, "models/arm_scene.xml");
        assert_eq!(config.rendering.max_geoms, 2000);
        assert_eq!(config.simulation.frame_sleep_ms, 1);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("steps_per_frame"));
        assert!(toml.contains("arm_scene.xml"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = Figment::new()
            .merge(Toml::string("[window]\nwidth = 640\n"))
            .extract()
            .unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 900);
        assert!(config.window.vsync);
    }

    #[test]
    fn test_missing_directory_uses_defaults() {
        let config = AppConfig::load_from("does/not/exist").unwrap();
        assert_eq!(config.camera.fovy, 45.0);
    }

    #[test]
    fn test_invalid_value_is_error() {
        let result: Result<AppConfig, ConfigError> = Figment::new()
            .merge(Toml::string("[window]\nwidth = \"wide\"\n"))
            .extract()
            .map_err(ConfigError::from);
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}

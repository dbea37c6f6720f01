//! Default simulator settings and the settings → configuration builder.
//!
//! `SimSettings` is a plain value. Derive per-run variants with struct
//! update syntax so the shared defaults are never mutated:
//!
//! ```ignore
//! let settings = SimSettings { scene: "NONE".into(), depth_sensor: true, ..Default::default() };
//! let cfg = make_cfg(&settings);
//! ```

use embodied_core::{
    AgentConfiguration, Configuration, SceneId, SensorSpec, SensorType, SimError,
    SimulatorConfiguration,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scene used when no other is given.
pub const DEFAULT_SCENE: &str = "data/scenes/default.glb";

/// Flat settings for a single-agent session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Sensor width in pixels
    pub width: u32,

    /// Sensor height in pixels
    pub height: u32,

    /// Scene path or "NONE"
    pub scene: String,

    pub default_agent: usize,

    /// Sensor mount height above the agent origin (meters)
    pub sensor_height: f32,

    pub color_sensor: bool,
    pub depth_sensor: bool,
    pub semantic_sensor: bool,

    pub seed: u64,
    pub enable_physics: bool,

    /// Meters per move_forward
    pub forward_amount: f32,

    /// Degrees per turn
    pub turn_amount: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scene: DEFAULT_SCENE.to_string(),
            default_agent: 0,
            sensor_height: 1.5,
            color_sensor: true,
            depth_sensor: false,
            semantic_sensor: false,
            seed: 1,
            enable_physics: false,
            forward_amount: 0.25,
            turn_amount: 30.0,
        }
    }
}

impl SimSettings {
    /// Loads settings from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let json = fs::read_to_string(path)
            .map_err(|e| SimError::config(format!("settings {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| SimError::config(format!("settings {}: {}", path.display(), e)))
    }

    fn sensor(&self, uuid: &str, sensor_type: SensorType) -> SensorSpec {
        let mut spec = SensorSpec::new(uuid, sensor_type);
        spec.resolution = [self.height, self.width];
        spec.position = [0.0, self.sensor_height, 0.0];
        spec
    }
}

/// Builds a one-agent configuration from flat settings.
pub fn make_cfg(settings: &SimSettings) -> Configuration {
    let sim = SimulatorConfiguration {
        scene_id: SceneId::from(settings.scene.as_str()),
        enable_physics: settings.enable_physics,
        random_seed: settings.seed,
        default_agent_id: settings.default_agent,
        ..Default::default()
    };

    let sensors = [
        (settings.color_sensor, "color_sensor", SensorType::Color),
        (settings.depth_sensor, "depth_sensor", SensorType::Depth),
        (settings.semantic_sensor, "semantic_sensor", SensorType::Semantic),
    ];
    let agent = AgentConfiguration {
        action_space: AgentConfiguration::default_action_space(
            settings.forward_amount,
            settings.turn_amount,
        ),
        sensor_specifications: sensors
            .into_iter()
            .filter(|(enabled, _, _)| *enabled)
            .map(|(_, uuid, kind)| settings.sensor(uuid, kind))
            .collect(),
        ..Default::default()
    };

    Configuration::new(sim, vec![agent])
}

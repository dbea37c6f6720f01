//! Typed simulator configuration.
//!
//! A `Configuration` is a plain value: callers build it, clone it freely,
//! and hand it to a session, which keeps its own frozen copy.

use crate::agent::{ActionKind, ActionSpec};
use crate::error::SimError;
use embodied_env::{SensorSpec, SensorType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Scene identifier keyword for "no scene mesh".
pub const NO_SCENE: &str = "NONE";

/// Scene to load: a geometry path, or no scene at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SceneId {
    /// Empty stage: no geometry, no navmesh
    #[default]
    None,

    /// Path to a stage asset
    Path(PathBuf),
}

impl SceneId {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SceneId::None)
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            SceneId::None => None,
            SceneId::Path(p) => Some(p),
        }
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == NO_SCENE {
            SceneId::None
        } else {
            SceneId::Path(PathBuf::from(s))
        }
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        SceneId::from(s.as_str())
    }
}

impl From<SceneId> for String {
    fn from(id: SceneId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneId::None => write!(f, "{}", NO_SCENE),
            SceneId::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Global simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfiguration {
    /// Stage to load
    pub scene_id: SceneId,

    /// Step object dynamics (gravity) on every tick
    pub enable_physics: bool,

    /// Seed for start-position sampling
    pub random_seed: u64,

    /// Seconds advanced per step
    pub physics_timestep: f64,

    /// Agent driven by `step`
    pub default_agent_id: usize,
}

impl Default for SimulatorConfiguration {
    fn default() -> Self {
        Self {
            scene_id: SceneId::None,
            enable_physics: false,
            random_seed: 1,
            physics_timestep: 1.0 / 60.0,
            default_agent_id: 0,
        }
    }
}

/// Per-agent body, actions and sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfiguration {
    /// Body height in meters
    pub height: f32,

    /// Body radius in meters
    pub radius: f32,

    /// Action name → effect
    pub action_space: BTreeMap<String, ActionSpec>,

    /// Sensors mounted on the body (may be empty)
    pub sensor_specifications: Vec<SensorSpec>,
}

impl AgentConfiguration {
    /// The standard discrete navigation actions.
    pub fn default_action_space(forward: f32, turn_degrees: f32) -> BTreeMap<String, ActionSpec> {
        BTreeMap::from([
            ("move_forward".to_string(), ActionSpec::new(ActionKind::MoveForward, forward)),
            ("turn_left".to_string(), ActionSpec::new(ActionKind::TurnLeft, turn_degrees)),
            ("turn_right".to_string(), ActionSpec::new(ActionKind::TurnRight, turn_degrees)),
        ])
    }

    /// Action names in sorted order.
    pub fn action_names(&self) -> Vec<&str> {
        self.action_space.keys().map(String::as_str).collect()
    }
}

impl Default for AgentConfiguration {
    fn default() -> Self {
        Self {
            height: 1.5,
            radius: 0.1,
            action_space: Self::default_action_space(0.25, 10.0),
            sensor_specifications: vec![SensorSpec::new("color_sensor", SensorType::Color)],
        }
    }
}

/// Complete configuration handed to a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub sim: SimulatorConfiguration,
    pub agents: Vec<AgentConfiguration>,
}

impl Configuration {
    pub fn new(sim: SimulatorConfiguration, agents: Vec<AgentConfiguration>) -> Self {
        Self { sim, agents }
    }

    /// Structural checks that need no backend.
    ///
    /// Scene resolution happens at session open, where the scene loader is
    /// available.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.agents.is_empty() {
            return Err(SimError::config("at least one agent configuration is required"));
        }
        if self.sim.default_agent_id >= self.agents.len() {
            return Err(SimError::config(format!(
                "default agent {} does not exist ({} agents configured)",
                self.sim.default_agent_id,
                self.agents.len()
            )));
        }
        if !(self.sim.physics_timestep.is_finite() && self.sim.physics_timestep > 0.0) {
            return Err(SimError::config(format!(
                "physics timestep must be positive, got {}",
                self.sim.physics_timestep
            )));
        }

        for (index, agent) in self.agents.iter().enumerate() {
            if let Some((name, _)) = agent.action_space.iter().find(|(_, a)| !a.amount.is_finite()) {
                return Err(SimError::config(format!(
                    "agent {}: action '{}' has a non-finite amount",
                    index, name
                )));
            }

            let mut seen = HashSet::new();
            for spec in &agent.sensor_specifications {
                if !seen.insert(spec.uuid.as_str()) {
                    return Err(SimError::config(format!(
                        "agent {}: duplicate sensor uuid '{}'",
                        index, spec.uuid
                    )));
                }
            }
        }

        Ok(())
    }
}

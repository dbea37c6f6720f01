//! Embodied Core - configuration, agents and attribute templates
//!
//! This library holds everything about a simulation that is independent of
//! a live session:
//! 1. **Configuration**: typed scene/agent/physics settings (`config`)
//! 2. **Agents**: body state and action application (`agent`)
//! 3. **Templates**: stage/object attribute records (`attributes`) and the
//!    copy-on-register template registry (`registry`)

pub mod agent;
pub mod attributes;
pub mod config;
pub mod error;
pub mod registry;

// Re-export key types for convenience
pub use agent::{ActionKind, ActionSpec, AgentBody, AgentState};
pub use attributes::{Attributes, ObjectAttributes, StageAttributes, TemplateId};
pub use config::{AgentConfiguration, Configuration, SceneId, SimulatorConfiguration};
pub use error::SimError;
pub use registry::{AttributesManager, ObjectAttributesManager, StageAttributesManager, TemplateLibrary};

pub use embodied_env::{SensorSpec, SensorType};

//! Error taxonomy for simulator sessions and template registries.

use embodied_env::EnvError;
use thiserror::Error;

/// Errors surfaced to callers of the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid or unresolvable scene/agent setup at open time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Action name not in the agent's action space
    #[error("Unknown action '{action}' for agent {agent}")]
    Action { action: String, agent: usize },

    /// Agent (or other indexed entity) index out of range
    #[error("{kind} index {index} out of range (count: {count})")]
    Index {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    /// Operation attempted on a closed session
    #[error("Session is closed")]
    ClosedSession,

    /// Bulk template import failed
    #[error("Failed to load templates from {path}: {reason}")]
    Load { path: String, reason: String },

    /// Malformed template registration input
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Backend failure
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl SimError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an agent index error.
    pub fn agent_index(index: usize, count: usize) -> Self {
        Self::Index {
            kind: "Agent",
            index,
            count,
        }
    }
}

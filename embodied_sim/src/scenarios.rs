//! Smoke scenarios exercising the session contract end to end.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Random actions on a stage without a navmesh never collide
    NoNavmeshSmoke,

    /// "NONE" scene renders empty frames and has no stage template
    EmptyScene,

    /// Reset restores the initialized agent state
    SimReset,

    /// Agent handles outlive their sessions without crashing
    KeepAgent,

    /// Sessions open and close repeatedly against one configuration
    ConstructDestroy,

    /// Long seeded random walk on a navmesh scene
    RandomWalk,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::NoNavmeshSmoke,
            ScenarioId::EmptyScene,
            ScenarioId::SimReset,
            ScenarioId::KeepAgent,
            ScenarioId::ConstructDestroy,
            ScenarioId::RandomWalk,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::NoNavmeshSmoke => "no_navmesh_smoke",
            ScenarioId::EmptyScene => "empty_scene",
            ScenarioId::SimReset => "sim_reset",
            ScenarioId::KeepAgent => "keep_agent",
            ScenarioId::ConstructDestroy => "construct_destroy",
            ScenarioId::RandomWalk => "random_walk",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::NoNavmeshSmoke => "50 random actions on a stage with no navmesh, zero collisions",
            ScenarioId::EmptyScene => "NONE scene with a depth sensor, no stage template",
            ScenarioId::SimReset => "random steps then reset, initial state restored",
            ScenarioId::KeepAgent => "keep agent handles across 3 session lifetimes",
            ScenarioId::ConstructDestroy => "open and close 3 sessions with one configuration",
            ScenarioId::RandomWalk => "seeded random walk on a navmesh scene, counting collisions",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "no_navmesh_smoke" | "no_navmesh" => Ok(ScenarioId::NoNavmeshSmoke),
            "empty_scene" | "empty" => Ok(ScenarioId::EmptyScene),
            "sim_reset" | "reset" => Ok(ScenarioId::SimReset),
            "keep_agent" => Ok(ScenarioId::KeepAgent),
            "construct_destroy" | "multiple_construct_destroy" => Ok(ScenarioId::ConstructDestroy),
            "random_walk" | "walk" => Ok(ScenarioId::RandomWalk),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("Sim-Reset".parse::<ScenarioId>(), Ok(ScenarioId::SimReset));
        assert!("teleport".parse::<ScenarioId>().is_err());
    }
}

//! JSON trajectory exporter.
//!
//! Writes one episode's agent trajectory (per-step pose and collision flag)
//! for offline plotting and replay checks.

use embodied_core::AgentState;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One step of an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFrame {
    /// Tick index (1-based, 0 is the initial state)
    pub tick: u64,

    /// Action taken to reach this frame (`None` for the initial state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Agent position [x, y, z]
    pub position: [f32; 3],

    /// Agent rotation as [i, j, k, w]
    pub rotation: [f32; 4],

    pub collided: bool,
}

impl StepFrame {
    pub fn new(tick: u64, action: Option<&str>, state: &AgentState, collided: bool) -> Self {
        let q = state.rotation.quaternion();
        Self {
            tick,
            action: action.map(str::to_string),
            position: [state.position.x, state.position.y, state.position.z],
            rotation: [q.i, q.j, q.k, q.w],
            collided,
        }
    }
}

/// Complete episode export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeExport {
    /// Scenario name
    pub scenario: String,

    /// Scene the episode ran in
    pub scene: String,

    /// Seed used
    pub seed: u64,

    /// All frames
    pub frames: Vec<StepFrame>,

    /// Total collisions
    pub collisions: u64,

    /// Final results
    pub passed: bool,
}

impl EpisodeExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, scene: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            scene: scene.to_string(),
            seed,
            frames: Vec::new(),
            collisions: 0,
            passed: false,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: StepFrame) {
        if frame.collided {
            self.collisions += 1;
        }
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn test_export_counts_collisions() {
        let state = AgentState::default();
        let mut export = EpisodeExport::new("random_walk", "NONE", 3);
        export.add_frame(StepFrame::new(0, None, &state, false));
        export.add_frame(StepFrame::new(1, Some("move_forward"), &state, true));
        export.finalize(true);

        assert_eq!(export.frames.len(), 2);
        assert_eq!(export.collisions, 1);
        assert_eq!(export.frames[0].rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.json");

        let state = AgentState::new(
            Vector3::new(1.0, 0.0, -2.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5),
        );
        let mut export = EpisodeExport::new("sim_reset", "demo/room.glb", 1);
        export.add_frame(StepFrame::new(1, Some("turn_left"), &state, false));
        export.write_to_file(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["scenario"], "sim_reset");
        assert_eq!(value["frames"][0]["action"], "turn_left");
        assert_eq!(value["frames"][0]["position"][2], -2.0);
    }
}

//! Agent bodies and discrete action application.
//!
//! Coordinate frame: +Y is up, the agent looks down -Z. Translations are in
//! meters, turns in degrees.

use crate::config::AgentConfiguration;
use crate::error::SimError;
use embodied_env::{NavMesh, SensorSpec};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Absolute tolerance used alongside the relative one in `approx_eq`.
const ROTATION_ATOL: f32 = 1e-8;

/// What an action does to the agent body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    TurnLeft,
    TurnRight,
    NoOp,
}

/// An entry of an agent's action space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub kind: ActionKind,

    /// Meters for moves, degrees for turns
    pub amount: f32,
}

impl ActionSpec {
    pub fn new(kind: ActionKind, amount: f32) -> Self {
        Self { kind, amount }
    }

    /// Returns true if the action changes the body position.
    pub fn is_translation(&self) -> bool {
        matches!(
            self.kind,
            ActionKind::MoveForward
                | ActionKind::MoveBackward
                | ActionKind::MoveLeft
                | ActionKind::MoveRight
        )
    }

    /// Returns the state reached by applying this action, ignoring obstacles.
    pub fn apply(&self, state: &AgentState) -> AgentState {
        let a = self.amount;
        let local_move = match self.kind {
            ActionKind::MoveForward => Some(Vector3::new(0.0, 0.0, -a)),
            ActionKind::MoveBackward => Some(Vector3::new(0.0, 0.0, a)),
            ActionKind::MoveLeft => Some(Vector3::new(-a, 0.0, 0.0)),
            ActionKind::MoveRight => Some(Vector3::new(a, 0.0, 0.0)),
            _ => None,
        };
        let yaw = match self.kind {
            ActionKind::TurnLeft => a,
            ActionKind::TurnRight => -a,
            _ => 0.0,
        };

        let mut next = *state;
        if let Some(delta) = local_move {
            next.position += state.rotation * delta;
        }
        if yaw != 0.0 {
            let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.to_radians());
            next.rotation = state.rotation * turn;
        }
        next
    }
}

/// Position and orientation of an agent body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl AgentState {
    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Exact position match and rotation coefficients within `rtol`.
    ///
    /// `q` and `-q` encode the same rotation, so either sign matches.
    pub fn approx_eq(&self, other: &AgentState, rtol: f32) -> bool {
        let a = self.rotation.quaternion().coords;
        let b = other.rotation.quaternion().coords;
        let close = |x: &nalgebra::Vector4<f32>| {
            x.iter()
                .zip(b.iter())
                .all(|(u, v)| (u - v).abs() <= ROTATION_ATOL + rtol * v.abs())
        };

        self.position == other.position && (close(&a) || close(&-a))
    }

    /// Heading around +Y in radians, zero when looking down -Z.
    pub fn yaw(&self) -> f32 {
        let forward = self.rotation * Vector3::new(0.0, 0.0, -1.0);
        (-forward.x).atan2(-forward.z)
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// A live agent inside a session.
#[derive(Debug, Clone)]
pub struct AgentBody {
    /// Index in the session's agent list
    index: usize,

    config: AgentConfiguration,

    /// State recorded at the most recent initialization
    initial_state: AgentState,

    state: AgentState,
}

impl AgentBody {
    pub fn new(index: usize, config: AgentConfiguration, initial_state: AgentState) -> Self {
        Self {
            index,
            config,
            initial_state,
            state: initial_state,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &AgentConfiguration {
        &self.config
    }

    pub fn initial_state(&self) -> AgentState {
        self.initial_state
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Overwrites the current state; `reset_initial` also re-records it as
    /// the reset target.
    pub fn set_state(&mut self, state: AgentState, reset_initial: bool) {
        self.state = state;
        if reset_initial {
            self.initial_state = state;
        }
    }

    /// Restores the state recorded at initialization.
    pub fn reset(&mut self) {
        self.state = self.initial_state;
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.config.action_space.contains_key(name)
    }

    /// Applies a named action and returns whether the move collided.
    ///
    /// Without a navmesh there is nothing to collide with, so the result is
    /// always `false`.
    pub fn act(&mut self, action: &str, navmesh: Option<&NavMesh>) -> Result<bool, SimError> {
        let spec = self
            .config
            .action_space
            .get(action)
            .copied()
            .ok_or_else(|| SimError::Action {
                action: action.to_string(),
                agent: self.index,
            })?;

        let target = spec.apply(&self.state);
        let collided = match navmesh {
            Some(nav) if spec.is_translation() => {
                let (position, collided) = nav.try_step(&self.state.position, &target.position);
                self.state = AgentState::new(position, target.rotation);
                collided
            }
            _ => {
                self.state = target;
                false
            }
        };

        Ok(collided)
    }

    /// World pose of a sensor mounted on this body.
    pub fn sensor_pose(&self, spec: &SensorSpec) -> Isometry3<f32> {
        let offset = self.state.rotation * Vector3::from(spec.position);
        Isometry3::from_parts(
            Translation3::from(self.state.position + offset),
            self.state.rotation,
        )
    }
}

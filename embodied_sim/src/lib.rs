//! Embodied Simulator Session Layer
//!
//! This crate provides the live side of the simulator: a `Simulator`
//! session bound to one `Configuration`, driving agents through discrete
//! actions over a backend that supplies geometry, navmeshes and frames.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Simulator                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐   │
//! │  │  SimContext  │  │  AgentBody   │  │   PhysicsWorld   │   │
//! │  │ (clock, RNG) │  │  #0 .. #n    │  │ (object table)   │   │
//! │  └──────────────┘  └──────┬───────┘  └────────┬─────────┘   │
//! │                           │ try_step          │ templates   │
//! │  ┌────────────────────────▼───────────────────▼─────────┐   │
//! │  │ Backend: SceneLoader · NavmeshProvider · Renderer    │   │
//! │  │          TemplateLibrary (shared across sessions)    │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use embodied_sim::{make_cfg, SimSettings, Simulator};
//!
//! let settings = SimSettings {
//!     scene: "NONE".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut sim = Simulator::open(make_cfg(&settings))?;
//! let obs = sim.step("move_forward")?;
//! assert!(!obs.collided);
//! ```

mod backend;
mod context;
mod exporter;
mod physics;
mod runner;
mod settings;
mod simulator;
pub mod scenarios;

pub use backend::{Backend, StaticScenes, DEMO_FLOOR, DEMO_ROOM};
pub use context::SimContext;
pub use exporter::{EpisodeExport, StepFrame};
pub use physics::{MotionType, ObjectId, ObjectInstance, PhysicsWorld};
pub use runner::{ScenarioResult, ScenarioRunner};
pub use settings::{make_cfg, SimSettings, DEFAULT_SCENE};
pub use simulator::{AgentHandle, Observation, Simulator};

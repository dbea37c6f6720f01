//! Embodied Environment Abstraction Layer
//!
//! This crate is the boundary between the simulator's session layer and the
//! backend that actually owns geometry, navigation and pixels:
//! - Scenes (`SceneLoader` → `SceneGraph` with cumulative bounding boxes)
//! - Navigation (`NavmeshProvider` → optional `NavMesh`)
//! - Sensors (`RenderBackend` → `Frame`)
//!
//! Production implementations read from the filesystem (`GltfSceneLoader`,
//! `FileNavmeshProvider`). Simulation and test implementations live in
//! `embodied_sim` and serve scenes from memory.
//!
//! # Example
//!
//! ```ignore
//! use embodied_env::{GltfSceneLoader, SceneLoader};
//!
//! let loader = GltfSceneLoader::new();
//! let path = loader.resolve("data/test_assets/scenes/stage_floor1.glb".as_ref())?;
//! let mut graph = loader.load_stage(&path)?;
//! let bounds = graph.compute_cumulative_bb(graph.root());
//! ```

mod error;
mod fs_impl;
mod geometry;
mod navmesh;
mod render;
mod scene;

pub use error::EnvError;
pub use fs_impl::{FileNavmeshProvider, GltfSceneLoader};
pub use geometry::Aabb;
pub use navmesh::{NavMesh, NavRegion, NavmeshProvider};
pub use render::{BlankRenderer, Frame, RenderBackend, SensorSpec, SensorType};
pub use scene::{SceneGraph, SceneLoader, SceneNode};

//! Backend bundles and the in-memory scene source used for simulation runs.

use embodied_core::TemplateLibrary;
use embodied_env::{
    Aabb, BlankRenderer, EnvError, FileNavmeshProvider, GltfSceneLoader, NavMesh, NavRegion,
    NavmeshProvider, RenderBackend, SceneGraph, SceneLoader,
};
use nalgebra::{Matrix4, Translation3, Vector3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Built-in room: 5 x 3 x 5 m with a navmesh covering the floor.
pub const DEMO_ROOM: &str = "demo/room.glb";

/// Built-in floor slab with no navmesh.
pub const DEMO_FLOOR: &str = "demo/stage_floor.glb";

/// The external collaborators a session talks to.
#[derive(Clone)]
pub struct Backend {
    pub scenes: Arc<dyn SceneLoader>,
    pub navmeshes: Arc<dyn NavmeshProvider>,
    pub renderer: Arc<dyn RenderBackend>,
    pub templates: Arc<TemplateLibrary>,
}

impl Backend {
    /// glTF scenes and `.navmesh` files from disk, the process-wide
    /// template library.
    pub fn filesystem() -> Self {
        Self {
            scenes: Arc::new(GltfSceneLoader::new()),
            navmeshes: Arc::new(FileNavmeshProvider::new()),
            renderer: Arc::new(BlankRenderer),
            templates: TemplateLibrary::global(),
        }
    }

    /// Scenes served from memory with a private template library.
    pub fn in_memory(scenes: StaticScenes) -> Self {
        let scenes = Arc::new(scenes);
        Self {
            scenes: scenes.clone(),
            navmeshes: scenes,
            renderer: Arc::new(BlankRenderer),
            templates: TemplateLibrary::shared(),
        }
    }

    /// In-memory backend preloaded with the demo scenes.
    pub fn demo() -> Result<Self, EnvError> {
        StaticScenes::demo().map(Self::in_memory)
    }

    /// Replaces the template library.
    pub fn with_templates(mut self, templates: Arc<TemplateLibrary>) -> Self {
        self.templates = templates;
        self
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::filesystem()
    }
}

#[derive(Debug, Clone)]
struct StaticScene {
    graph: SceneGraph,
    navmesh: Option<NavMesh>,
}

/// Scene source backed by prebuilt graphs.
///
/// Serves as both `SceneLoader` and `NavmeshProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticScenes {
    scenes: HashMap<PathBuf, StaticScene>,
}

impl StaticScenes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scene under `path`.
    pub fn with_scene(mut self, path: impl Into<PathBuf>, graph: SceneGraph, navmesh: Option<NavMesh>) -> Self {
        self.scenes.insert(path.into(), StaticScene { graph, navmesh });
        self
    }

    /// `DEMO_ROOM` and `DEMO_FLOOR`.
    pub fn demo() -> Result<Self, EnvError> {
        Ok(Self::new()
            .with_scene(DEMO_ROOM, demo_room()?, Some(demo_room_navmesh()))
            .with_scene(DEMO_FLOOR, demo_floor()?, None))
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    fn scene(&self, path: &Path) -> Result<&StaticScene, EnvError> {
        self.scenes
            .get(path)
            .ok_or_else(|| EnvError::not_found(path.display()))
    }
}

impl SceneLoader for StaticScenes {
    fn resolve(&self, path: &Path) -> Result<PathBuf, EnvError> {
        self.scene(path).map(|_| path.to_path_buf())
    }

    fn load_stage(&self, path: &Path) -> Result<SceneGraph, EnvError> {
        self.scene(path).map(|s| s.graph.clone())
    }
}

impl NavmeshProvider for StaticScenes {
    fn navmesh_for(&self, scene: &Path) -> Result<Option<NavMesh>, EnvError> {
        Ok(self.scenes.get(scene).and_then(|s| s.navmesh.clone()))
    }
}

fn demo_room() -> Result<SceneGraph, EnvError> {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let slab = |min: [f32; 3], max: [f32; 3]| Some(Aabb::new(Vector3::from(min), Vector3::from(max)));

    // Room is authored around its own origin and shifted into place
    let room = graph.add_node(
        root,
        Some("room".into()),
        Translation3::new(2.5, 0.0, 2.5).to_homogeneous(),
        None,
    )?;
    let parts = [
        ("floor", slab([-2.5, -0.1, -2.5], [2.5, 0.0, 2.5])),
        ("ceiling", slab([-2.5, 3.0, -2.5], [2.5, 3.1, 2.5])),
        ("wall_north", slab([-2.5, 0.0, -2.6], [2.5, 3.0, -2.5])),
        ("wall_south", slab([-2.5, 0.0, 2.5], [2.5, 3.0, 2.6])),
    ];
    for (name, bb) in parts {
        graph.add_node(room, Some(name.into()), Matrix4::identity(), bb)?;
    }
    Ok(graph)
}

fn demo_room_navmesh() -> NavMesh {
    NavMesh::new(vec![NavRegion::new(Aabb::new(
        Vector3::new(0.2, 0.0, 0.2),
        Vector3::new(4.8, 0.0, 4.8),
    ))])
}

fn demo_floor() -> Result<SceneGraph, EnvError> {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    graph.add_node(
        root,
        Some("floor".into()),
        Matrix4::identity(),
        Some(Aabb::new(Vector3::new(-10.0, -0.2, -10.0), Vector3::new(10.0, 0.0, 10.0))),
    )?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scenes_resolve() {
        let scenes = StaticScenes::demo().unwrap();
        assert_eq!(scenes.len(), 2);
        assert!(scenes.resolve(Path::new(DEMO_ROOM)).is_ok());
        assert!(matches!(
            scenes.resolve(Path::new("demo/missing.glb")),
            Err(EnvError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_demo_room_bounds() {
        let scenes = StaticScenes::demo().unwrap();
        let mut graph = scenes.load_stage(Path::new(DEMO_ROOM)).unwrap();
        let root = graph.root();
        let bb = graph.compute_cumulative_bb(root).unwrap();

        assert!(bb.approx_eq(
            &Aabb::new(Vector3::new(0.0, -0.1, -0.1), Vector3::new(5.0, 3.1, 5.1)),
            1e-5
        ));
    }

    #[test]
    fn test_demo_navmesh_presence() {
        let scenes = StaticScenes::demo().unwrap();
        assert!(scenes.navmesh_for(Path::new(DEMO_ROOM)).unwrap().is_some());
        assert!(scenes.navmesh_for(Path::new(DEMO_FLOOR)).unwrap().is_none());
    }
}

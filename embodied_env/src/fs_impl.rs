//! Production backend implementations reading from the filesystem.

use crate::error::EnvError;
use crate::geometry::Aabb;
use crate::navmesh::{NavMesh, NavmeshProvider};
use crate::scene::{SceneGraph, SceneLoader};
use nalgebra::{Matrix4, Vector3};
use std::path::{Path, PathBuf};

/// Scene loader backed by glTF 2.0 files (`.glb` or `.gltf`).
///
/// Only the node hierarchy and primitive bounds are read; vertex buffers
/// are never touched, so external `.bin` files need not be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSceneLoader;

impl GltfSceneLoader {
    pub fn new() -> Self {
        Self
    }

    fn attach(graph: &mut SceneGraph, parent: usize, node: &gltf::Node<'_>) -> Result<(), EnvError> {
        let transformation = Matrix4::from(node.transform().matrix());
        let mesh_bb = node.mesh().and_then(|mesh| {
            mesh.primitives()
                .map(|primitive| {
                    let bb = primitive.bounding_box();
                    Aabb::new(Vector3::from(bb.min), Vector3::from(bb.max))
                })
                .reduce(|a, b| a.join(&b))
        });

        let index = graph.add_node(parent, node.name().map(str::to_string), transformation, mesh_bb)?;
        for child in node.children() {
            Self::attach(graph, index, &child)?;
        }
        Ok(())
    }
}

impl SceneLoader for GltfSceneLoader {
    fn resolve(&self, path: &Path) -> Result<PathBuf, EnvError> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(EnvError::not_found(path.display()))
        }
    }

    fn load_stage(&self, path: &Path) -> Result<SceneGraph, EnvError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EnvError::not_found(path.display()),
            _ => EnvError::asset(path.display(), e),
        })?;
        let gltf = gltf::Gltf::from_slice(&bytes).map_err(|e| EnvError::asset(path.display(), e))?;

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
        if let Some(scene) = scene {
            for node in scene.nodes() {
                Self::attach(&mut graph, root, &node)?;
            }
        }

        Ok(graph)
    }
}

/// Looks for a `<scene>.navmesh` JSON file next to the scene asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNavmeshProvider;

impl FileNavmeshProvider {
    pub fn new() -> Self {
        Self
    }

    /// Path where the navmesh for `scene` is expected.
    pub fn navmesh_path(scene: &Path) -> PathBuf {
        scene.with_extension("navmesh")
    }
}

impl NavmeshProvider for FileNavmeshProvider {
    fn navmesh_for(&self, scene: &Path) -> Result<Option<NavMesh>, EnvError> {
        let path = Self::navmesh_path(scene);
        if !path.is_file() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)
            .map_err(|e| EnvError::NavmeshError(format!("{}: {}", path.display(), e)))?;
        NavMesh::from_json(&json).map(Some)
    }
}

//! Scene graph and the loader boundary that produces it.

use crate::error::EnvError;
use crate::geometry::Aabb;
use nalgebra::Matrix4;
use std::path::{Path, PathBuf};

/// A node in the scene graph.
///
/// Transformations are local (relative to the parent node). Bounding boxes
/// are expressed in the node's own frame.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Optional node name from the source asset
    pub name: Option<String>,

    /// Parent node index (`None` for the root)
    pub parent: Option<usize>,

    /// Child node indices
    pub children: Vec<usize>,

    /// Local transformation relative to the parent
    pub transformation: Matrix4<f32>,

    /// Bounds of the geometry attached directly to this node
    pub mesh_bb: Option<Aabb>,

    /// Cached result of the last `compute_cumulative_bb`
    cumulative_bb: Option<Aabb>,
}

impl SceneNode {
    fn new(
        name: Option<String>,
        parent: Option<usize>,
        transformation: Matrix4<f32>,
        mesh_bb: Option<Aabb>,
    ) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            transformation,
            mesh_bb,
            cumulative_bb: None,
        }
    }

    /// Bounds of this node's subtree as of the last computation.
    pub fn cumulative_bb(&self) -> Option<Aabb> {
        self.cumulative_bb
    }
}

/// Arena-backed scene graph. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates a graph containing only an identity root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(
                Some("root".to_string()),
                None,
                Matrix4::identity(),
                None,
            )],
        }
    }

    /// Index of the root node.
    pub fn root(&self) -> usize {
        0
    }

    /// Appends a node under `parent` and returns its index.
    pub fn add_node(
        &mut self,
        parent: usize,
        name: Option<String>,
        transformation: Matrix4<f32>,
        mesh_bb: Option<Aabb>,
    ) -> Result<usize, EnvError> {
        if parent >= self.nodes.len() {
            return Err(EnvError::SceneGraph(format!(
                "parent node {} does not exist ({} nodes)",
                parent,
                self.nodes.len()
            )));
        }

        let index = self.nodes.len();
        self.nodes
            .push(SceneNode::new(name, Some(parent), transformation, mesh_bb));
        self.nodes[parent].children.push(index);

        Ok(index)
    }

    pub fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    /// Number of nodes including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node carries geometry.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.mesh_bb.is_none())
    }

    /// Computes and caches the cumulative bounds of `index`'s subtree.
    ///
    /// Each child's cumulative box is carried into the parent frame by the
    /// child's local transformation, so the result for the root is the
    /// world-space extent of the scene.
    pub fn compute_cumulative_bb(&mut self, index: usize) -> Option<Aabb> {
        let node = self.nodes.get(index)?;
        let children = node.children.clone();
        let mut bb = node.mesh_bb;

        for child in children {
            let Some(child_bb) = self.compute_cumulative_bb(child) else {
                continue;
            };
            let in_parent = child_bb.transformed(&self.nodes[child].transformation);
            bb = Some(match bb {
                Some(acc) => acc.join(&in_parent),
                None => in_parent,
            });
        }

        self.nodes[index].cumulative_bb = bb;
        bb
    }

    /// Cached cumulative bounds of a node.
    pub fn cumulative_bb(&self, index: usize) -> Option<Aabb> {
        self.nodes.get(index).and_then(|n| n.cumulative_bb)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves scene identifiers and turns them into scene graphs.
///
/// # Implementations
///
/// - **Production**: `GltfSceneLoader` - parses `.glb`/`.gltf` files
/// - **Simulation**: `StaticScenes` (in `embodied_sim`) - serves graphs from memory
pub trait SceneLoader: Send + Sync {
    /// Resolves a scene path, failing with `EnvError::AssetNotFound` if it
    /// does not point at a loadable asset.
    fn resolve(&self, path: &Path) -> Result<PathBuf, EnvError>;

    /// Loads the stage geometry for a resolved path.
    fn load_stage(&self, path: &Path) -> Result<SceneGraph, EnvError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, Vector3};

    #[test]
    fn test_empty_graph_has_no_bounds() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        assert!(graph.is_empty());
        assert_eq!(graph.compute_cumulative_bb(root), None);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_node_rejects_unknown_parent() {
        let mut graph = SceneGraph::new();
        let result = graph.add_node(7, None, Matrix4::identity(), None);
        assert!(matches!(result, Err(EnvError::SceneGraph(_))));
    }

    #[test]
    fn test_cumulative_bb_applies_child_transforms() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        let unit = Aabb::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0));
        let group = graph
            .add_node(root, Some("group".into()), Translation3::new(10.0, 0.0, 0.0).to_homogeneous(), None)
            .unwrap();
        graph
            .add_node(group, Some("leaf".into()), Translation3::new(0.0, 2.0, 0.0).to_homogeneous(), Some(unit))
            .unwrap();
        graph
            .add_node(root, Some("floor".into()), Matrix4::identity(), Some(unit))
            .unwrap();

        let bb = graph.compute_cumulative_bb(root).unwrap();
        assert!(bb.approx_eq(
            &Aabb::new(Vector3::zeros(), Vector3::new(11.0, 3.0, 1.0)),
            1e-6
        ));

        // Intermediate nodes are cached in their own frame
        let group_bb = graph.cumulative_bb(group).unwrap();
        assert!(group_bb.approx_eq(
            &Aabb::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(1.0, 3.0, 1.0)),
            1e-6
        ));
    }

    #[test]
    fn test_cumulative_bb_is_cached_on_node() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let unit = Aabb::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0));
        graph.add_node(root, None, Matrix4::identity(), Some(unit)).unwrap();

        assert_eq!(graph.node(root).unwrap().cumulative_bb(), None);
        graph.compute_cumulative_bb(root);
        assert_eq!(graph.node(root).unwrap().cumulative_bb(), Some(unit));
    }
}

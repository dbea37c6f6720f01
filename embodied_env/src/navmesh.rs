//! Navigable-surface mesh and the provider boundary.
//!
//! The navmesh is a set of walkable regions. Each region is an axis-aligned
//! box whose `min.y` is the floor height and whose xz extent is the walkable
//! footprint. This is coarse compared to a baked polygon mesh, but it is
//! enough for step filtering and start-point sampling.

use crate::error::EnvError;
use crate::geometry::Aabb;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum vertical distance between a point and a region floor for the
/// point to count as standing on that region.
const MAX_FLOOR_OFFSET: f32 = 0.5;

/// A single walkable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavRegion {
    pub bounds: Aabb,
}

impl NavRegion {
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }

    /// Floor height of the region.
    pub fn floor(&self) -> f32 {
        self.bounds.min.y
    }

    /// Walkable area in square meters.
    pub fn area(&self) -> f32 {
        let size = self.bounds.size();
        size.x * size.z
    }

    fn supports(&self, p: &Vector3<f32>) -> bool {
        p.x >= self.bounds.min.x
            && p.x <= self.bounds.max.x
            && p.z >= self.bounds.min.z
            && p.z <= self.bounds.max.z
            && (p.y - self.floor()).abs() <= MAX_FLOOR_OFFSET
    }
}

/// Navigable mesh for a loaded scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavMesh {
    pub regions: Vec<NavRegion>,
}

impl NavMesh {
    pub fn new(regions: Vec<NavRegion>) -> Self {
        Self { regions }
    }

    /// Parses a navmesh from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, EnvError> {
        serde_json::from_str(json).map_err(|e| EnvError::NavmeshError(e.to_string()))
    }

    /// Number of disconnected walkable regions.
    pub fn island_count(&self) -> usize {
        self.regions.len()
    }

    /// Bounds of all regions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        self.regions
            .iter()
            .map(|r| r.bounds)
            .reduce(|a, b| a.join(&b))
    }

    pub fn is_navigable(&self, p: &Vector3<f32>) -> bool {
        self.regions.iter().any(|r| r.supports(p))
    }

    /// Projects a point onto the closest region floor.
    pub fn snap_point(&self, p: &Vector3<f32>) -> Option<Vector3<f32>> {
        self.regions
            .iter()
            .map(|r| {
                let clamped = Vector3::new(
                    p.x.clamp(r.bounds.min.x, r.bounds.max.x),
                    r.floor(),
                    p.z.clamp(r.bounds.min.z, r.bounds.max.z),
                );
                ((clamped - p).norm_squared(), clamped)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, snapped)| snapped)
    }

    /// Filters a straight-line move against the walkable surface.
    ///
    /// Returns the reachable end position and whether the move was blocked.
    /// A blocked move tries to slide along each horizontal axis before
    /// giving up and staying at `start`.
    pub fn try_step(&self, start: &Vector3<f32>, end: &Vector3<f32>) -> (Vector3<f32>, bool) {
        if self.is_navigable(end) {
            return (*end, false);
        }

        let along_x = Vector3::new(end.x, end.y, start.z);
        let along_z = Vector3::new(start.x, end.y, end.z);
        let slide = [along_x, along_z]
            .into_iter()
            .filter(|p| self.is_navigable(p))
            .max_by(|a, b| (a - start).norm_squared().total_cmp(&(b - start).norm_squared()));

        match slide {
            Some(p) => (p, true),
            None => (*start, true),
        }
    }

    /// Samples a point uniformly over the walkable area.
    pub fn random_navigable_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector3<f32>> {
        let total: f32 = self.regions.iter().map(|r| r.area()).sum();
        if self.regions.is_empty() {
            return None;
        }

        let mut pick = rng.gen::<f32>() * total;
        let region = self
            .regions
            .iter()
            .find(|r| {
                pick -= r.area();
                pick <= 0.0
            })
            .or_else(|| self.regions.last())?;

        let b = &region.bounds;
        let x = b.min.x + rng.gen::<f32>() * (b.max.x - b.min.x);
        let z = b.min.z + rng.gen::<f32>() * (b.max.z - b.min.z);
        Some(Vector3::new(x, region.floor(), z))
    }
}

/// Supplies the navmesh for a loaded scene, if one exists.
pub trait NavmeshProvider: Send + Sync {
    /// Returns `Ok(None)` when the scene has no navmesh.
    fn navmesh_for(&self, scene: &Path) -> Result<Option<NavMesh>, EnvError>;
}
